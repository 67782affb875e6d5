//! ags - command-line access to the shared agent state document.

use std::process::ExitCode;

fn main() -> ExitCode {
    match agentstate::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
