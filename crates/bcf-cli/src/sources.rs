//! Proxy list intake: flags, files and the public pool endpoint.

use anyhow::{Context, Result};
use bcf_core::error::ConfigError;
use bcf_core::proxy::ProxySources;
use std::path::Path;
use std::time::Duration;
use url::Url;

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "socks4", "socks5"];

/// Resolve every configured proxy source into pool intake order.
pub async fn gather(
    user: &[String],
    file: Option<&Path>,
    public: Option<(String, u32)>,
) -> Result<ProxySources> {
    let mut sources = ProxySources::default();
    for raw in user {
        sources.user.push(normalize_proxy(raw)?);
    }
    if let Some(path) = file {
        sources.file = read_proxy_file(path)?;
    }
    if let Some((endpoint, count)) = public {
        sources.public = fetch_public_proxies(&endpoint, count).await?;
    }
    Ok(sources)
}

/// Normalize one proxy address into `scheme://host:port` form. Bare
/// `host:port` gets an `http://` scheme; http(s) without an explicit
/// port falls back to the scheme default.
pub fn normalize_proxy(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::ProxySource {
            detail: "empty proxy address".to_string(),
        });
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let parsed = Url::parse(&candidate).map_err(|err| ConfigError::ProxySource {
        detail: format!("invalid proxy address {trimmed:?}: {err}"),
    })?;
    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(ConfigError::ProxySource {
            detail: format!(
                "unsupported proxy scheme {:?} in {trimmed:?}",
                parsed.scheme()
            ),
        });
    }
    let host = parsed.host_str().ok_or_else(|| ConfigError::ProxySource {
        detail: format!("proxy address {trimmed:?} has no host"),
    })?;
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| ConfigError::ProxySource {
            detail: format!("proxy address {trimmed:?} has no port"),
        })?;
    Ok(format!("{}://{}:{}", parsed.scheme(), host, port))
}

/// Read proxies from a file: one per line, `#` comments and blanks skipped.
pub fn read_proxy_file(path: &Path) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("read proxy file {}", path.display()))?;
    parse_proxy_lines(&data)
}

fn parse_proxy_lines(data: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        out.push(normalize_proxy(line)?);
    }
    Ok(out)
}

/// Fetch up to `count` proxies from a plain-text public pool endpoint.
/// Unparsable lines are skipped rather than failing the whole list.
pub async fn fetch_public_proxies(endpoint: &str, count: u32) -> Result<Vec<String>> {
    let url = endpoint.to_string();
    let body = tokio::task::spawn_blocking(move || fetch_text(&url))
        .await
        .context("public pool task join")??;

    let mut out = Vec::new();
    for line in body.lines() {
        if out.len() >= count as usize {
            break;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match normalize_proxy(line) {
            Ok(address) => out.push(address),
            Err(err) => tracing::debug!(line, %err, "public pool line skipped"),
        }
    }
    if out.is_empty() {
        anyhow::bail!("public pool at {endpoint} yielded no usable proxies");
    }
    tracing::info!(count = out.len(), endpoint, "public proxies fetched");
    Ok(out)
}

/// Plain GET for the public pool list. Runs on the blocking pool.
fn fetch_text(url: &str) -> Result<String> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid public pool URL")?;
    easy.follow_location(true)?;
    easy.connect_timeout(Duration::from_secs(10))?;
    easy.timeout(Duration::from_secs(30))?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform().context("public pool request failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("public pool returned HTTP {code}");
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}
