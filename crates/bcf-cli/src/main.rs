use bcf_core::logging;

mod cli;
mod client;
mod ids;
mod output;
mod sources;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    // Parse CLI and dispatch. A clean run exits 0, a run with failed
    // items exits 2, hard errors exit 1.
    match CliCommand::run_from_args().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("bcf error: {:#}", err);
            std::process::exit(1);
        }
    }
}
