use advisor_core::{ModelPlan, ModelSpec};
use advisor_local::OpenAiTransport;
use std::net::SocketAddr;
use std::time::Duration;

/// Everything `advisor serve` needs. Each flag also reads an env var so the gateway can be
/// configured entirely from a deployment environment.
#[derive(clap::Args, Clone)]
pub struct GatewayConfig {
    /// Address to listen on.
    #[arg(long, env = "ADVISOR_BIND", default_value = "127.0.0.1:8787")]
    pub bind: SocketAddr,

    /// Provider API key (server-side secret; never printed).
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Provider origin; `/v1/chat/completions` is appended.
    #[arg(
        long,
        env = "ADVISOR_UPSTREAM_BASE_URL",
        default_value = "https://api.openai.com"
    )]
    pub upstream_base_url: String,

    #[arg(
        long,
        env = "ADVISOR_PRIMARY_MODEL",
        default_value = "gpt-4o-with-web-search"
    )]
    pub primary_model: String,

    #[arg(long, env = "ADVISOR_PRIMARY_MAX_TOKENS", default_value_t = 800)]
    pub primary_max_tokens: u32,

    /// Web-search result cap declared on primary calls (0 disables the tool).
    #[arg(long, env = "ADVISOR_SEARCH_MAX_RESULTS", default_value_t = 5)]
    pub search_max_results: u32,

    #[arg(long, env = "ADVISOR_BASELINE_MODEL", default_value = "gpt-4o")]
    pub baseline_model: String,

    #[arg(long, env = "ADVISOR_BASELINE_MAX_TOKENS", default_value_t = 500)]
    pub baseline_max_tokens: u32,

    #[arg(long, env = "ADVISOR_TEMPERATURE", default_value_t = 0.7)]
    pub temperature: f64,

    /// Timeout for each upstream call (ms, clamped to 1000..=300000).
    #[arg(long, env = "ADVISOR_TIMEOUT_MS", default_value_t = advisor_local::DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bind", &self.bind)
            .field("api_key_set", &self.api_key.is_some())
            .field("upstream_base_url", &self.upstream_base_url)
            .field("primary_model", &self.primary_model)
            .field("primary_max_tokens", &self.primary_max_tokens)
            .field("search_max_results", &self.search_max_results)
            .field("baseline_model", &self.baseline_model)
            .field("baseline_max_tokens", &self.baseline_max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl GatewayConfig {
    pub fn plan(&self) -> ModelPlan {
        ModelPlan {
            primary: ModelSpec {
                model: self.primary_model.clone(),
                max_tokens: self.primary_max_tokens,
                temperature: self.temperature,
                search_max_results: Some(self.search_max_results).filter(|n| *n > 0),
            },
            baseline: ModelSpec {
                model: self.baseline_model.clone(),
                max_tokens: self.baseline_max_tokens,
                temperature: self.temperature,
                search_max_results: None,
            },
        }
    }

    pub fn timeout(&self) -> Duration {
        advisor_local::timeout_from_ms(self.timeout_ms)
    }

    pub fn transport(&self, client: reqwest::Client) -> anyhow::Result<OpenAiTransport> {
        let key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing OPENAI_API_KEY (or --api-key)"))?;
        Ok(OpenAiTransport::new(
            client,
            self.upstream_base_url.clone(),
            key,
            self.timeout(),
        ))
    }
}
