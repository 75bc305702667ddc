use advisor_core::{ChatTransport, CompletionRequest, CompletionResponse, Error, Result};
use std::time::{Duration, Instant};

use crate::{env, snippet};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

fn api_key_from_env() -> Option<String> {
    env("OPENAI_API_KEY")
}

fn base_url_from_env() -> Option<String> {
    env("ADVISOR_UPSTREAM_BASE_URL")
}

/// Chat-completions transport for an OpenAI-style provider.
///
/// The bearer key lives only here, on the server side.
#[derive(Clone)]
pub struct OpenAiTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiTransport")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAiTransport {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout,
        }
    }

    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let api_key = api_key_from_env()
            .ok_or_else(|| Error::NotConfigured("missing OPENAI_API_KEY".to_string()))?;
        let base_url = base_url_from_env().unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self::new(
            client,
            base_url,
            api_key,
            crate::timeout_from_ms(
                env("ADVISOR_TIMEOUT_MS")
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(crate::DEFAULT_TIMEOUT_MS),
            ),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint_chat_completions(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Pull `error.message` out of an OpenAI-style error body, else a raw snippet.
fn upstream_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| snippet(body, 200))
}

#[async_trait::async_trait]
impl ChatTransport for OpenAiTransport {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse> {
        let t0 = Instant::now();
        let resp = self
            .client
            .post(self.endpoint_chat_completions())
            .timeout(self.timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .json(req)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable {
                status: None,
                message: if e.is_timeout() {
                    format!(
                        "{} timed out after {}ms",
                        req.model,
                        self.timeout.as_millis()
                    )
                } else {
                    format!("{}: {e}", req.model)
                },
            })?;

        let status = resp.status();
        tracing::debug!(
            model = %req.model,
            status = status.as_u16(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "chat.completions response"
        );
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable {
                status: Some(status.as_u16()),
                message: format!(
                    "{} chat.completions HTTP {status}: {}",
                    req.model,
                    upstream_error_message(&body)
                ),
            });
        }

        resp.json::<CompletionResponse>()
            .await
            .map_err(|e| Error::UpstreamUnavailable {
                status: Some(status.as_u16()),
                message: format!("{}: malformed chat.completions body: {e}", req.model),
            })
    }
}
