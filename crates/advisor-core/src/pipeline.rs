//! Primary-then-baseline fallback policy.
//!
//! One request runs at most two sequential upstream calls and keeps no state between requests.

use serde::{Deserialize, Serialize};

use crate::prompt;
use crate::request::{ChatRequest, ChatResponse};
use crate::wire::{CompletionRequest, Message, Tool};
use crate::{ChatTransport, Error, Result};

/// Model name plus sampling knobs for one stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSpec {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// When set, the request declares a web-search tool capped at this many results.
    pub search_max_results: Option<u32>,
}

impl ModelSpec {
    pub fn primary_default() -> Self {
        Self {
            model: "gpt-4o-with-web-search".to_string(),
            max_tokens: 800,
            temperature: 0.7,
            search_max_results: Some(5),
        }
    }

    pub fn baseline_default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            search_max_results: None,
        }
    }

    pub fn completion_request(&self, messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tools: self.search_max_results.map(|n| vec![Tool::web_search(n)]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelPlan {
    pub primary: ModelSpec,
    pub baseline: ModelSpec,
}

impl Default for ModelPlan {
    fn default() -> Self {
        Self {
            primary: ModelSpec::primary_default(),
            baseline: ModelSpec::baseline_default(),
        }
    }
}

/// Terminal state of one pipeline run.
#[derive(Debug)]
pub enum Outcome {
    Primary(ChatResponse),
    Fallback {
        response: ChatResponse,
        primary_error: Error,
    },
    Failed(Error),
}

impl Outcome {
    pub fn into_result(self) -> Result<ChatResponse> {
        match self {
            Outcome::Primary(r) | Outcome::Fallback { response: r, .. } => Ok(r),
            Outcome::Failed(e) => Err(e),
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Outcome::Primary(_) => "primary",
            Outcome::Fallback { .. } => "fallback",
            Outcome::Failed(_) => "failed",
        }
    }
}

/// A 2xx reply without a usable first choice is as good as a failed call.
async fn attempt(
    transport: &dyn ChatTransport,
    spec: &ModelSpec,
    messages: Vec<Message>,
) -> Result<(String, Option<serde_json::Value>)> {
    let resp = transport
        .complete(&spec.completion_request(messages))
        .await?;
    let text = resp
        .first_content()
        .map(str::to_string)
        .ok_or_else(|| Error::UpstreamUnavailable {
            status: None,
            message: format!("{}: response has no first choice", spec.model),
        })?;
    Ok((text, resp.web_search_results))
}

/// Validate, try the primary model, and on any primary failure try the baseline model once.
pub async fn run_pipeline(
    transport: &dyn ChatTransport,
    plan: &ModelPlan,
    req: &ChatRequest,
) -> Outcome {
    if let Err(e) = req.validate() {
        return Outcome::Failed(e);
    }
    let messages = prompt::messages(req);

    let primary_error = match attempt(transport, &plan.primary, messages.clone()).await {
        Ok((text, search_results)) => {
            return Outcome::Primary(ChatResponse {
                text,
                used_primary_model: true,
                search_results,
            })
        }
        Err(e) => e,
    };
    tracing::warn!(
        transport = transport.name(),
        model = %plan.primary.model,
        error = %primary_error,
        "primary model unavailable, falling back to baseline model"
    );

    match attempt(transport, &plan.baseline, messages).await {
        Ok((text, _)) => Outcome::Fallback {
            response: ChatResponse {
                text,
                used_primary_model: false,
                search_results: None,
            },
            primary_error,
        },
        Err(e) => {
            tracing::error!(
                transport = transport.name(),
                model = %plan.baseline.model,
                error = %e,
                "baseline model unavailable"
            );
            Outcome::Failed(Error::FallbackUnavailable {
                primary: primary_error.to_string(),
                fallback: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::CompletionResponse;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted replies in order and records every request.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<CompletionResponse>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<CompletionResponse>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<CompletionRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ChatTransport for ScriptedTransport {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse> {
            self.seen.lock().unwrap().push(req.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected call to {}", req.model))
        }
    }

    fn http(status: u16) -> Error {
        Error::UpstreamUnavailable {
            status: Some(status),
            message: format!("HTTP {status}"),
        }
    }

    #[tokio::test]
    async fn primary_success_keeps_search_results() {
        let mut reply = CompletionResponse::from_text("Use SPF daily");
        reply.web_search_results = Some(serde_json::json!([{"url": "https://example.test"}]));
        let t = ScriptedTransport::new(vec![Ok(reply)]);

        let out = run_pipeline(&t, &ModelPlan::default(), &ChatRequest::new("sunscreen?")).await;
        let r = match out {
            Outcome::Primary(r) => r,
            other => panic!("expected primary, got {other:?}"),
        };
        assert!(r.used_primary_model);
        assert_eq!(r.text, "Use SPF daily");
        assert_eq!(
            r.search_results,
            Some(serde_json::json!([{"url": "https://example.test"}]))
        );

        let seen = t.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gpt-4o-with-web-search");
        assert_eq!(seen[0].max_tokens, 800);
        assert_eq!(seen[0].temperature, 0.7);
        assert_eq!(seen[0].tools, Some(vec![Tool::web_search(5)]));
    }

    #[tokio::test]
    async fn primary_without_search_results_is_still_primary() {
        let t = ScriptedTransport::new(vec![Ok(CompletionResponse::from_text("ok"))]);
        let r = run_pipeline(&t, &ModelPlan::default(), &ChatRequest::new("q"))
            .await
            .into_result()
            .unwrap();
        assert!(r.used_primary_model);
        assert_eq!(r.search_results, None);
    }

    #[tokio::test]
    async fn non_2xx_primary_falls_back_exactly_once() {
        let t = ScriptedTransport::new(vec![
            Err(http(503)),
            Ok(CompletionResponse::from_text("Try X")),
        ]);
        let req = ChatRequest::new("Help with dry skin").with_concern("dryness");
        let out = run_pipeline(&t, &ModelPlan::default(), &req).await;
        assert_eq!(out.stage(), "fallback");
        let Outcome::Fallback {
            response,
            primary_error,
        } = out
        else {
            unreachable!()
        };
        assert_eq!(response.text, "Try X");
        assert!(!response.used_primary_model);
        assert_eq!(response.search_results, None);
        assert!(matches!(
            primary_error,
            Error::UpstreamUnavailable {
                status: Some(503),
                ..
            }
        ));

        let seen = t.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].model, "gpt-4o");
        assert_eq!(seen[1].max_tokens, 500);
        assert_eq!(seen[1].temperature, 0.7);
        assert_eq!(seen[1].tools, None);
        // Both stages share the composed system message.
        assert_eq!(seen[0].messages, seen[1].messages);
        assert!(seen[1].messages[0]
            .content
            .contains("User's main concern: dryness."));
    }

    #[tokio::test]
    async fn empty_primary_reply_is_treated_as_unavailable() {
        let t = ScriptedTransport::new(vec![
            Ok(CompletionResponse::default()),
            Ok(CompletionResponse::from_text("baseline")),
        ]);
        let r = run_pipeline(&t, &ModelPlan::default(), &ChatRequest::new("q"))
            .await
            .into_result()
            .unwrap();
        assert_eq!(r.text, "baseline");
        assert!(!r.used_primary_model);
    }

    #[tokio::test]
    async fn both_failing_reports_both_errors() {
        let t = ScriptedTransport::new(vec![Err(http(503)), Err(http(429))]);
        let out = run_pipeline(&t, &ModelPlan::default(), &ChatRequest::new("q")).await;
        let Outcome::Failed(e) = out else {
            panic!("expected failure");
        };
        let detail = e.to_string();
        assert!(matches!(e, Error::FallbackUnavailable { .. }));
        assert!(detail.contains("HTTP 503"), "{detail}");
        assert!(detail.contains("HTTP 429"), "{detail}");
        assert_eq!(t.seen().len(), 2);
    }

    #[tokio::test]
    async fn empty_message_never_reaches_upstream() {
        let t = ScriptedTransport::new(vec![]);
        let out = run_pipeline(&t, &ModelPlan::default(), &ChatRequest::new("")).await;
        assert!(matches!(out, Outcome::Failed(Error::Validation(_))));
        assert!(t.seen().is_empty());
    }

    #[test]
    fn plan_roundtrips_through_config_json() {
        let plan: ModelPlan = serde_json::from_value(serde_json::json!({
            "primary": {"model": "p", "max_tokens": 10, "temperature": 0.1, "search_max_results": 2},
            "baseline": {"model": "b", "max_tokens": 5, "temperature": 0.2, "search_max_results": null}
        }))
        .unwrap();
        let req = plan.primary.completion_request(vec![]);
        assert_eq!(req.tools, Some(vec![Tool::web_search(2)]));
        assert_eq!(plan.baseline.completion_request(vec![]).tools, None);
    }
}
