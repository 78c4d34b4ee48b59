//! CLI for the bcf bulk caption fetcher.

mod commands;

use anyhow::Result;
use bcf_core::config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_fetch, run_probe};

/// Top-level CLI for the bcf bulk caption fetcher.
#[derive(Debug, Parser)]
#[command(name = "bcf")]
#[command(about = "bcf: concurrent proxy-rotating bulk caption fetcher", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch caption tracks for a list of video ids or URLs.
    Fetch(FetchArgs),

    /// Probe the caption endpoint through each configured proxy.
    Probe(ProbeArgs),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Video ids or watch URLs.
    #[arg(value_name = "ID_OR_URL")]
    pub items: Vec<String>,

    /// File with one id or URL per line (`#` comments allowed).
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory the fetched `<id>.json` files are written to.
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Proxy address, repeatable (e.g. `http://1.2.3.4:8080`).
    #[arg(long = "proxy", value_name = "ADDR")]
    pub proxies: Vec<String>,

    /// File with one proxy address per line.
    #[arg(long, value_name = "FILE")]
    pub proxy_file: Option<PathBuf>,

    /// Fetch N proxies from the configured public pool endpoint.
    #[arg(long, value_name = "N")]
    pub public_proxies: Option<u32>,

    /// Allow attempts without a proxy (also the fallback once every
    /// proxy is banned).
    #[arg(long)]
    pub direct: bool,

    /// Concurrent fetch workers (overrides config).
    #[arg(long, value_name = "N")]
    pub jobs: Option<u32>,

    /// Politeness delay between attempts per worker, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Per-attempt timeout in seconds (overrides config).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Caption language, repeatable; the first one is requested.
    #[arg(short = 'l', long = "language", value_name = "LANG")]
    pub languages: Vec<String>,

    /// Stop after the first N enumerated ids.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Replace existing output files instead of skipping them.
    #[arg(long)]
    pub overwrite: bool,

    /// Skip the preflight probe even if the config enables it.
    #[arg(long)]
    pub no_preflight: bool,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Video id or URL used for the probe request.
    #[arg(value_name = "ID_OR_URL", default_value = "jNQXAC9IVRw")]
    pub item: String,

    /// Proxy address, repeatable.
    #[arg(long = "proxy", value_name = "ADDR")]
    pub proxies: Vec<String>,

    /// File with one proxy address per line.
    #[arg(long, value_name = "FILE")]
    pub proxy_file: Option<PathBuf>,

    /// Fetch N proxies from the configured public pool endpoint.
    #[arg(long, value_name = "N")]
    pub public_proxies: Option<u32>,

    /// Per-probe timeout in seconds (overrides config).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl CliCommand {
    /// Parse arguments, load the config and dispatch. Returns the
    /// process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch(args) => run_fetch(args, &cfg).await,
            CliCommand::Probe(args) => run_probe(args, &cfg).await,
        }
    }
}

#[cfg(test)]
mod tests;
