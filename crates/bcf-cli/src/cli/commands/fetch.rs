//! `bcf fetch` – run the bulk caption fetch.

use anyhow::{Context, Result};
use bcf_core::config::BcfConfig;
use bcf_core::control::CancelToken;
use bcf_core::orchestrator::{FetchOrchestrator, RunOptions};
use bcf_core::proxy::ProxyPool;
use bcf_core::status::{StatusAggregator, StatusSnapshot};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cli::FetchArgs;
use crate::client::TimedTextClient;
use crate::{ids, output, sources};

const PROGRESS_INTERVAL_MS: u64 = 250;

pub async fn run_fetch(args: FetchArgs, cfg: &BcfConfig) -> Result<i32> {
    let items = ids::collect_ids(&args.items, args.input.as_deref(), args.limit)?;
    if items.is_empty() {
        anyhow::bail!("nothing to fetch: pass ids/URLs or --input FILE");
    }

    let public = match args.public_proxies {
        Some(count) => {
            let endpoint = cfg
                .public_pool_url
                .clone()
                .context("--public-proxies requires public_pool_url in config.toml")?;
            Some((endpoint, count))
        }
        None => None,
    };
    let proxy_sources = sources::gather(&args.proxies, args.proxy_file.as_deref(), public).await?;
    let pool = Arc::new(ProxyPool::build(proxy_sources, args.direct)?);

    // Flag overrides on top of the loaded config.
    let policy = cfg.retry_policy();
    let mut options = RunOptions::from_config(cfg);
    if let Some(jobs) = args.jobs {
        options.jobs = jobs;
    }
    if let Some(ms) = args.delay_ms {
        options.attempt_delay = Duration::from_millis(ms);
    }
    if let Some(secs) = args.timeout {
        options.attempt_timeout = Duration::from_secs(secs);
    }
    if args.no_preflight {
        options.preflight = false;
    }

    let language = args
        .languages
        .first()
        .or_else(|| cfg.languages.first())
        .cloned()
        .unwrap_or_else(|| "en".to_string());
    let fetcher = Arc::new(TimedTextClient::new(language, options.attempt_timeout));

    let (status_tx, mut status_rx) = tokio::sync::mpsc::channel::<StatusSnapshot>(64);
    let status = Arc::new(StatusAggregator::new(Some(status_tx)));
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        while let Some(snap) = status_rx.recv().await {
            let now = Instant::now();
            let done = snap.total > 0 && snap.completed >= snap.total;
            if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS || done {
                print!(
                    "\r{}/{} done  ok {}  none {}  failed {}  proxy-failed {}  banned {}  jobs {} ",
                    snap.completed,
                    snap.total,
                    snap.succeeded,
                    snap.no_resource,
                    snap.failed,
                    snap.proxy_failed,
                    snap.banned_proxies,
                    snap.active_jobs
                );
                let _ = std::io::stdout().flush();
                last_print = now;
            }
        }
        println!();
    });

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\ninterrupt: letting in-flight attempts finish");
                cancel.cancel();
            }
        });
    }

    println!(
        "fetching {} item(s) with {} worker(s), {} prox(ies)",
        items.len(),
        options.jobs.max(1),
        pool.active_count()
    );

    let orchestrator = FetchOrchestrator::new(
        options,
        policy,
        Arc::clone(&pool),
        fetcher,
        Arc::clone(&status),
        cancel,
    );
    let report = orchestrator.run(items).await?;

    // The status channel closes once every sender is gone; only then does
    // the progress task print its final newline.
    drop(status);
    let _ = progress_handle.await;

    let files = output::write_captions(&report, &args.output_dir, args.overwrite)?;
    output::print_summary(&report, &files);

    Ok(if report.is_clean() { 0 } else { 2 })
}
