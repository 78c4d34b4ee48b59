//! Result persistence: one JSON document per fetched item, plus the
//! end-of-run summary block.

use anyhow::{Context, Result};
use bcf_core::report::RunReport;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// What `write_captions` did for the succeeded bucket.
#[derive(Debug, Default)]
pub struct WriteSummary {
    pub written: usize,
    pub skipped: usize,
}

/// Write one `<id>.json` per succeeded item into `dir`. Existing files
/// are kept unless `overwrite` is set. Ids are validated to the 11-char
/// alphabet, so they are safe as file names.
pub fn write_captions(report: &RunReport, dir: &Path, overwrite: bool) -> Result<WriteSummary> {
    if report.succeeded.is_empty() {
        return Ok(WriteSummary::default());
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create output dir {}", dir.display()))?;
    let fetched_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut summary = WriteSummary::default();
    for record in &report.succeeded {
        let Some(payload) = record.payload.as_ref() else {
            continue;
        };
        let path = dir.join(format!("{}.json", record.id));
        if path.exists() && !overwrite {
            tracing::debug!(id = %record.id, "output file exists, skipped");
            summary.skipped += 1;
            continue;
        }
        let doc = serde_json::json!({
            "id": record.id,
            "language": payload.language,
            "fetched_at": fetched_at,
            "captions": payload.body,
        });
        let json = serde_json::to_string_pretty(&doc)?;
        std::fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
        summary.written += 1;
    }
    tracing::info!(
        written = summary.written,
        skipped = summary.skipped,
        dir = %dir.display(),
        "caption files written"
    );
    Ok(summary)
}

/// Human summary block printed after the run.
pub fn print_summary(report: &RunReport, files: &WriteSummary) {
    println!();
    println!("{:<14} {}", "fetched:", report.succeeded.len());
    println!("{:<14} {}", "no captions:", report.no_resource.len());
    println!("{:<14} {}", "failed:", report.failed.len());
    println!("{:<14} {}", "proxy failed:", report.proxy_failed.len());
    println!(
        "{:<14} {} written, {} skipped",
        "files:", files.written, files.skipped
    );
    if !report.banned_proxies.is_empty() {
        println!("{:<14} {}", "banned:", report.banned_proxies.join(", "));
    }
    for record in report.failed.iter().chain(report.proxy_failed.iter()) {
        println!(
            "  {}  {} ({} attempt(s))",
            record.id, record.detail, record.attempts
        );
    }
}
