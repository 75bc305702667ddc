//! Caller side of the gateway: one request in, one reply (or error) out.

use advisor_core::{ChatRequest, ChatResponse, Error, ErrorEnvelope, Result};
use std::time::Duration;

use crate::snippet;

#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    endpoint: url::Url,
    timeout: Duration,
}

impl GatewayClient {
    /// `base_url` is the gateway origin (optionally with a path prefix); `/api/chat` is appended.
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Result<Self> {
        let raw = format!("{}/api/chat", base_url.trim().trim_end_matches('/'));
        let endpoint = url::Url::parse(&raw)
            .map_err(|e| Error::NotConfigured(format!("invalid gateway url {base_url:?}: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::NotConfigured(format!(
                "gateway url must be http(s): {base_url:?}"
            )));
        }
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Send one prompt. No retry here: fallback is the gateway's job.
    pub async fn send_prompt(&self, req: &ChatRequest) -> Result<ChatResponse> {
        req.validate()?;

        let resp = self
            .client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(req)
            .send()
            .await
            .map_err(|e| Error::RequestFailed {
                status: None,
                message: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| Error::RequestFailed {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(Error::RequestFailed {
                status: Some(status.as_u16()),
                message: failure_message(&body),
            });
        }

        ChatResponse::from_envelope(&body).map_err(|e| match e {
            Error::RequestFailed { message, .. } => Error::RequestFailed {
                status: Some(status.as_u16()),
                message,
            },
            other => other,
        })
    }
}

/// Prefer the envelope's `details`, then its `error`, then the raw body.
fn failure_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(env) if !env.details.trim().is_empty() => env.details,
        Ok(env) => env.error,
        Err(_) => snippet(&String::from_utf8_lossy(body), 200),
    }
}
