//! Caption transport over libcurl: one GET per attempt against the
//! public timedtext endpoint, optionally through a proxy.
//!
//! The blocking curl call runs on the blocking pool; the orchestrator
//! additionally bounds every attempt with its own timeout.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bcf_core::fetch::{CaptionFetcher, CaptionPayload, Connection, FetchError};

/// Rotated per request so a bulk run does not present one client signature.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.2420.81",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

/// Caption documents are small; anything past this aborts the transfer.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Fetch client for the public timedtext caption endpoint.
pub struct TimedTextClient {
    language: String,
    timeout: Duration,
    next_agent: AtomicUsize,
}

impl TimedTextClient {
    pub fn new(language: String, timeout: Duration) -> Self {
        Self {
            language,
            timeout,
            next_agent: AtomicUsize::new(0),
        }
    }

    /// Ids and language codes are validated upstream to URL-safe
    /// alphabets, so the query needs no escaping.
    fn request_url(&self, id: &str) -> String {
        format!(
            "https://www.youtube.com/api/timedtext?lang={}&v={}",
            self.language, id
        )
    }

    fn user_agent(&self) -> &'static str {
        let idx = self.next_agent.fetch_add(1, Ordering::Relaxed);
        USER_AGENTS[idx % USER_AGENTS.len()]
    }
}

#[async_trait]
impl CaptionFetcher for TimedTextClient {
    async fn fetch(&self, id: &str, connection: &Connection) -> Result<CaptionPayload, FetchError> {
        let url = self.request_url(id);
        let agent = self.user_agent();
        let proxy = match connection {
            Connection::Direct => None,
            Connection::Proxy(address) => Some(address.clone()),
        };
        let timeout = self.timeout;

        let (code, body) =
            tokio::task::spawn_blocking(move || fetch_blocking(&url, proxy.as_deref(), agent, timeout))
                .await
                .map_err(|err| FetchError::Other(format!("transport task join: {err}")))?
                .map_err(|err| map_curl_error(&err))?;

        classify_response(id, code, &body, &self.language)
    }
}

/// One GET, body buffered in memory. Runs on the blocking pool.
fn fetch_blocking(
    url: &str,
    proxy: Option<&str>,
    agent: &str,
    timeout: Duration,
) -> Result<(u32, Vec<u8>), curl::Error> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.useragent(agent)?;
    easy.follow_location(true)?;
    easy.max_redirections(5)?;
    easy.connect_timeout(Duration::from_secs(10))?;
    easy.timeout(timeout)?;
    if let Some(address) = proxy {
        easy.proxy(address)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            if body.len() + data.len() > MAX_BODY_BYTES {
                return Ok(0); // abort transfer
            }
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    Ok((code, body))
}

/// Map libcurl transport errors into the typed fetch error.
fn map_curl_error(err: &curl::Error) -> FetchError {
    if err.is_operation_timedout() {
        FetchError::Timeout
    } else if err.is_couldnt_connect()
        || err.is_couldnt_resolve_host()
        || err.is_couldnt_resolve_proxy()
        || err.is_recv_error()
        || err.is_send_error()
        || err.is_got_nothing()
    {
        FetchError::Network(err.to_string())
    } else if err.is_write_error() {
        FetchError::Other("response exceeded the body cap".to_string())
    } else {
        FetchError::Other(err.to_string())
    }
}

/// Map the HTTP response into a payload or a typed failure. The endpoint
/// answers 200 with an empty document when the item has no track in the
/// requested language.
fn classify_response(
    id: &str,
    code: u32,
    body: &[u8],
    language: &str,
) -> Result<CaptionPayload, FetchError> {
    match code {
        200 => {
            let text = String::from_utf8_lossy(body);
            if text.trim().is_empty() {
                Err(FetchError::NoCaptions(format!(
                    "no {language} captions for {id}"
                )))
            } else {
                Ok(CaptionPayload {
                    language: Some(language.to_string()),
                    body: text.into_owned(),
                })
            }
        }
        404 | 410 => Err(FetchError::Gone(format!("HTTP {code}"))),
        429 => Err(FetchError::RateLimited),
        403 => Err(FetchError::Blocked),
        code => Err(FetchError::UpstreamStatus(code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_carries_language_and_id() {
        let client = TimedTextClient::new("de".to_string(), Duration::from_secs(5));
        assert_eq!(
            client.request_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/api/timedtext?lang=de&v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn user_agents_rotate_round_robin() {
        let client = TimedTextClient::new("en".to_string(), Duration::from_secs(5));
        let first = client.user_agent();
        let second = client.user_agent();
        assert_ne!(first, second);
        for _ in 2..USER_AGENTS.len() {
            client.user_agent();
        }
        // One full cycle brings the first agent back around.
        assert_eq!(client.user_agent(), first);
    }

    #[test]
    fn ok_response_with_body_is_a_payload() {
        let payload = classify_response("vid", 200, b"<transcript/>", "en").unwrap();
        assert_eq!(payload.language.as_deref(), Some("en"));
        assert_eq!(payload.body, "<transcript/>");
    }

    #[test]
    fn empty_ok_response_means_no_captions() {
        assert!(matches!(
            classify_response("vid", 200, b"  \n", "en"),
            Err(FetchError::NoCaptions(_))
        ));
    }

    #[test]
    fn missing_resource_statuses_map_to_gone() {
        assert!(matches!(
            classify_response("vid", 404, b"", "en"),
            Err(FetchError::Gone(_))
        ));
        assert!(matches!(
            classify_response("vid", 410, b"", "en"),
            Err(FetchError::Gone(_))
        ));
    }

    #[test]
    fn ban_signatures_map_to_their_kinds() {
        assert!(matches!(
            classify_response("vid", 429, b"", "en"),
            Err(FetchError::RateLimited)
        ));
        assert!(matches!(
            classify_response("vid", 403, b"", "en"),
            Err(FetchError::Blocked)
        ));
    }

    #[test]
    fn other_statuses_pass_through() {
        assert!(matches!(
            classify_response("vid", 503, b"", "en"),
            Err(FetchError::UpstreamStatus(503))
        ));
    }
}
