//! Item enumeration: bare video ids, watch URLs and id files.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use url::Url;

/// Canonical 11-character id alphabet. Doubles as the guarantee that an
/// id is safe to use as an output file name.
pub fn is_video_id(s: &str) -> bool {
    s.len() == 11
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Extract an id from a bare id or an absolute URL in one of the known
/// shapes: `watch?v=`, `youtu.be/<id>`, `/shorts/<id>`, `/embed/<id>`.
pub fn parse_item(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if is_video_id(trimmed) {
        return Some(trimmed.to_string());
    }
    let url = Url::parse(trimmed).ok()?;
    if let Some(id) = url
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
    {
        if is_video_id(&id) {
            return Some(id);
        }
    }
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let candidate = match segments.as_slice() {
        [id] => *id,
        ["shorts" | "embed", id] => *id,
        _ => return None,
    };
    is_video_id(candidate).then(|| candidate.to_string())
}

/// Collect ids from positional items and an optional file, preserving
/// first-seen order, deduplicated, optionally capped at `limit`.
pub fn collect_ids(
    items: &[String],
    input: Option<&Path>,
    limit: Option<usize>,
) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut push = |raw: &str| -> Result<()> {
        match parse_item(raw) {
            Some(id) => {
                if seen.insert(id.clone()) {
                    out.push(id);
                }
                Ok(())
            }
            None => anyhow::bail!("not a video id or recognized URL: {raw:?}"),
        }
    };

    for raw in items {
        push(raw)?;
    }
    if let Some(path) = input {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read id file {}", path.display()))?;
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            push(line)?;
        }
    }

    if let Some(limit) = limit {
        out.truncate(limit);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn id_alphabet_is_enforced() {
        assert!(is_video_id("dQw4w9WgXcQ"));
        assert!(is_video_id("a-b_c-d_e-f"));
        assert!(!is_video_id("too-short"));
        assert!(!is_video_id("exactly12chr"));
        assert!(!is_video_id("bad/slash!!"));
    }

    #[test]
    fn bare_ids_and_known_url_shapes_parse() {
        assert_eq!(parse_item("dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            parse_item("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            parse_item("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            parse_item("https://www.youtube.com/shorts/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            parse_item("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn junk_is_rejected() {
        assert!(parse_item("not an id").is_none());
        assert!(parse_item("https://www.youtube.com/watch?v=bad").is_none());
        assert!(parse_item("https://example.com/a/b/c").is_none());
    }

    #[test]
    fn collect_dedups_and_preserves_order() {
        let items = vec![
            "dQw4w9WgXcQ".to_string(),
            "https://youtu.be/jNQXAC9IVRw".to_string(),
            "dQw4w9WgXcQ".to_string(),
        ];
        let ids = collect_ids(&items, None, None).unwrap();
        assert_eq!(ids, vec!["dQw4w9WgXcQ".to_string(), "jNQXAC9IVRw".to_string()]);
    }

    #[test]
    fn collect_honors_limit() {
        let items = vec![
            "dQw4w9WgXcQ".to_string(),
            "jNQXAC9IVRw".to_string(),
            "9bZkp7q19f0".to_string(),
        ];
        let ids = collect_ids(&items, None, Some(2)).unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn collect_reads_files_with_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# batch one").unwrap();
        writeln!(file, "dQw4w9WgXcQ").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "https://youtu.be/jNQXAC9IVRw").unwrap();
        let ids = collect_ids(&[], Some(file.path()), None).unwrap();
        assert_eq!(ids, vec!["dQw4w9WgXcQ".to_string(), "jNQXAC9IVRw".to_string()]);
    }

    #[test]
    fn collect_surfaces_bad_input() {
        let items = vec!["definitely not valid".to_string()];
        assert!(collect_ids(&items, None, None).is_err());
    }
}
