use advisor_core::{Error, Result};
use std::time::Duration;

pub mod client;
pub mod openai;
pub mod store;

pub use client::GatewayClient;
pub use openai::OpenAiTransport;
pub use store::FileSelectionStore;

/// Per-call timeout for every outbound request unless configured otherwise.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub(crate) fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Per-call timeout from a configured millisecond value, clamped to 1 s..=300 s.
///
/// Every path that reads `ADVISOR_TIMEOUT_MS` goes through here.
pub fn timeout_from_ms(ms: u64) -> Duration {
    Duration::from_millis(ms.clamp(1_000, 300_000))
}

/// Shared reqwest client. Per-request timeouts are set by each caller.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("advisor/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| Error::NotConfigured(format!("http client: {e}")))
}

/// Keep diagnostic snippets of upstream bodies short.
pub(crate) fn snippet(body: &str, max_chars: usize) -> String {
    let t = body.trim();
    if t.chars().count() <= max_chars {
        return t.to_string();
    }
    let mut s: String = t.chars().take(max_chars).collect();
    s.push('…');
    s
}
