//! CLI command handlers, one file per subcommand.

mod fetch;
mod probe;

pub use fetch::run_fetch;
pub use probe::run_probe;
