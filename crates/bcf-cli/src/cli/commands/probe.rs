//! `bcf probe` – check the caption endpoint through each configured proxy.

use anyhow::{Context, Result};
use bcf_core::config::BcfConfig;
use bcf_core::fetch::{CaptionFetcher, Connection, FetchError};
use bcf_core::proxy::ProxyPool;
use std::time::Duration;

use crate::cli::ProbeArgs;
use crate::client::TimedTextClient;
use crate::{ids, sources};

pub async fn run_probe(args: ProbeArgs, cfg: &BcfConfig) -> Result<i32> {
    let id = ids::parse_item(&args.item)
        .with_context(|| format!("not a video id or recognized URL: {:?}", args.item))?;

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

    // The pool handles dedup and ordering; with no proxies at all the
    // probe goes out directly.
    let pool = ProxyPool::build(proxy_sources, true)?;
    let mut connections: Vec<Connection> = pool
        .snapshot_active()
        .into_iter()
        .map(Connection::Proxy)
        .collect();
    if connections.is_empty() {
        connections.push(Connection::Direct);
    }

    let timeout = Duration::from_secs(args.timeout.unwrap_or(cfg.timeout_secs));
    let language = cfg
        .languages
        .first()
        .cloned()
        .unwrap_or_else(|| "en".to_string());
    let client = TimedTextClient::new(language, timeout);

    println!("{:<28} {}", "CONNECTION", "RESULT");
    let mut failures = 0usize;
    for connection in connections {
        let probed = tokio::time::timeout(timeout, client.fetch(&id, &connection)).await;
        let verdict = match probed {
            Ok(Ok(payload)) => format!("ok, {} bytes", payload.body.len()),
            Ok(Err(err @ (FetchError::NoCaptions(_) | FetchError::Gone(_)))) => {
                // The endpoint answered; the probe id just has nothing to
                // serve. The connection itself works.
                format!("reachable ({err})")
            }
            Ok(Err(err)) => {
                failures += 1;
                err.to_string()
            }
            Err(_) => {
                failures += 1;
                "timed out".to_string()
            }
        };
        println!("{:<28} {}", connection.to_string(), verdict);
    }
    Ok(if failures == 0 { 0 } else { 2 })
}
