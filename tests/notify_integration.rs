//! Integration tests for change notification and the revision stream.

use std::time::{Duration, Instant};

use futures::StreamExt;
use tempfile::TempDir;

use agentstate::core::notify::ChangeNotifier;
use agentstate::core::store::DocumentStore;
use agentstate::core::stream::{PulseKind, RevisionStream};
use agentstate::core::types::Revision;

fn open(dir: &TempDir) -> DocumentStore {
    DocumentStore::open(dir.path().join("state.json"))
}

fn bump(store: &DocumentStore) -> Revision {
    let snapshot = store.load().unwrap();
    store.update(snapshot.revision, |doc| doc).unwrap().revision
}

fn bump_to(store: &DocumentStore, target: u64) {
    while store.load().unwrap().revision.get() < target {
        bump(store);
    }
}

async fn bump_later(store: DocumentStore, delay: Duration) {
    tokio::time::sleep(delay).await;
    tokio::task::spawn_blocking(move || bump(&store))
        .await
        .unwrap();
}

#[tokio::test]
async fn idle_wait_times_out_with_same_revision() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    bump_to(&store, 5);

    let notifier = ChangeNotifier::new(store);
    let started = Instant::now();
    let seen = notifier
        .wait_for_revision(Revision::new(5), Duration::from_millis(200))
        .await
        .unwrap();

    assert_eq!(seen, Revision::new(5));
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn write_from_other_handle_releases_waiter_early() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    bump_to(&store, 5);

    // A separate handle shares only the file, like another process.
    let other = open(&dir);
    let notifier = ChangeNotifier::new(store).with_poll_interval(Duration::from_millis(10));
    let writer = tokio::spawn(bump_later(other, Duration::from_millis(50)));

    let started = Instant::now();
    let seen = notifier
        .wait_for_revision(Revision::new(5), Duration::from_millis(200))
        .await
        .unwrap();

    assert_eq!(seen, Revision::new(6));
    assert!(started.elapsed() < Duration::from_millis(180));
    writer.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn waiters_release_at_their_own_thresholds() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.load().unwrap();

    let notifier = ChangeNotifier::new(store.clone());
    let early = tokio::spawn({
        let n = notifier.clone();
        async move { n.wait_for_revision(Revision::new(0), Duration::from_secs(5)).await }
    });
    let late = tokio::spawn({
        let n = notifier.clone();
        async move { n.wait_for_revision(Revision::new(1), Duration::from_secs(5)).await }
    });

    bump_later(store.clone(), Duration::from_millis(20)).await;
    assert_eq!(early.await.unwrap().unwrap(), Revision::new(1));
    assert!(!late.is_finished());

    bump_later(store.clone(), Duration::from_millis(20)).await;
    assert_eq!(late.await.unwrap().unwrap(), Revision::new(2));
}

#[tokio::test]
async fn abandoned_wait_leaves_store_writable() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let since = store.load().unwrap().revision;
    let notifier = ChangeNotifier::new(store.clone());

    let outcome = tokio::time::timeout(
        Duration::from_millis(30),
        notifier.wait_for_revision(since, Duration::from_secs(10)),
    )
    .await;
    assert!(outcome.is_err());

    assert_eq!(bump(&store), Revision::new(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stream_reports_changes_and_heartbeats() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let since = store.load().unwrap().revision;

    let notifier = ChangeNotifier::new(store.clone()).with_poll_interval(Duration::from_millis(10));
    let mut pulses =
        RevisionStream::new(notifier, since, Duration::from_millis(100)).into_stream();

    let writer = tokio::spawn(bump_later(store.clone(), Duration::from_millis(20)));
    let first = pulses.next().await.unwrap().unwrap();
    writer.await.unwrap();
    assert_eq!(first.kind, PulseKind::Changed);
    assert_eq!(first.revision, Revision::new(1));

    let second = pulses.next().await.unwrap().unwrap();
    assert_eq!(second.kind, PulseKind::Heartbeat);
    assert_eq!(second.revision, Revision::new(1));
}
