//! get command - Print one domain collection

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;

/// Print the named collection as pretty JSON.
pub fn get(ctx: &Context, collection: &str) -> Result<()> {
    let snapshot = ctx.store.load().context("Failed to load state")?;
    let Some(value) = snapshot.document.collection(collection) else {
        bail!("No collection named '{}'", collection);
    };

    if ctx.json {
        println!("{}", serde_json::to_string(value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}
