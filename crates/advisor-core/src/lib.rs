pub mod area;
pub mod catalog;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod request;
pub mod selection;
pub mod wire;

pub use catalog::{Catalog, Product};
pub use pipeline::{run_pipeline, ModelPlan, ModelSpec, Outcome};
pub use request::{ChatRequest, ChatResponse, ErrorEnvelope};
pub use selection::{MemoryStore, PersistedSelection, SelectionState, SELECTION_KEY};
pub use wire::{CompletionRequest, CompletionResponse, Message};

/// User-facing text returned in every failure envelope.
pub const GENERIC_ERROR_TEXT: &str = "Sorry, I encountered an error. Please try again.";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid request: {0}")]
    Validation(String),
    /// A single upstream model call failed: non-2xx, transport error, timeout or unusable body.
    #[error("upstream unavailable{}: {message}", fmt_status(.status))]
    UpstreamUnavailable {
        status: Option<u16>,
        message: String,
    },
    #[error("fallback model unavailable: {fallback} (primary: {primary})")]
    FallbackUnavailable { primary: String, fallback: String },
    #[error("not found")]
    NotFound,
    #[error("request failed{}: {message}", fmt_status(.status))]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("catalog error: {0}")]
    Catalog(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;

/// One chat-completion call against the upstream provider.
///
/// Implementations report every failure (HTTP status, network, timeout, undecodable body) as
/// [`Error::UpstreamUnavailable`]; the fallback policy lives in [`pipeline`], not here.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    fn name(&self) -> &'static str;
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse>;
}

/// Key-value persistence for client-side state (the browser's local storage, a file, memory).
pub trait SelectionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
