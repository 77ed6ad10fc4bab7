//! HTTP fetching for the `see_url` builtin

use std::time::Duration;

use aua_core::{AuaError, Result};
use tracing::warn;

/// Request timeout for `see_url`.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum response body size (10 MB).
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Perform an HTTP GET and return the body. Any non-2xx status is an
/// error.
pub fn fetch(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url)
        .map_err(|e| AuaError::Io(format!("invalid URL '{}': {}", url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AuaError::Io(format!(
            "unsupported URL scheme '{}' in '{}'",
            parsed.scheme(),
            url
        )));
    }

    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build();

    match agent.get(url).call() {
        Ok(response) => {
            let status = response.status();
            if !(200..300).contains(&status) {
                warn!(url, status, "see_url non-success status");
                return Err(AuaError::Io(format!("HTTP error {} for {}", status, url)));
            }
            let body = response
                .into_string()
                .map_err(|e| AuaError::Io(format!("failed to read body from {}: {}", url, e)))?;
            if body.len() > MAX_BODY_SIZE {
                return Err(AuaError::Io(format!(
                    "response body from {} too large ({} bytes, max {})",
                    url,
                    body.len(),
                    MAX_BODY_SIZE
                )));
            }
            Ok(body)
        }
        Err(ureq::Error::Status(code, _)) => {
            warn!(url, status = code, "see_url non-success status");
            Err(AuaError::Io(format!("HTTP error {} for {}", code, url)))
        }
        Err(e) => Err(AuaError::Io(format!("request to {} failed: {}", url, e))),
    }
}
