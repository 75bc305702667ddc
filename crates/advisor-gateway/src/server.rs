use advisor_core::{
    run_pipeline, ChatRequest, ChatTransport, Error, ErrorEnvelope, ModelPlan, Outcome,
};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, MatchedPath, Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue, Method, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;

/// Immutable per-process state shared by every request handler.
pub struct Gateway {
    transport: Arc<dyn ChatTransport>,
    plan: ModelPlan,
}

impl Gateway {
    pub fn new(transport: Arc<dyn ChatTransport>, plan: ModelPlan) -> Self {
        Self { transport, plan }
    }

    pub async fn handle(&self, req: &ChatRequest) -> Outcome {
        run_pipeline(self.transport.as_ref(), &self.plan, req).await
    }
}

pub type AppState = Arc<Gateway>;

/// `POST /api/chat`; preflight for any path; 404 for everything else.
///
/// Request bodies are not size-capped: the message has no length limit.
pub fn router(gateway: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat).fallback(not_found))
        .fallback(not_found)
        .with_state(gateway)
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn(cors))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %path,
                    )
                })
                .on_request(|_request: &axum::http::Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &Span| {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                ),
        )
}

pub async fn serve(bind: SocketAddr, gateway: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "gateway listening");
    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutting down");
    }
}

/// Preflight is answered for every path without routing; all other responses get the
/// allow-origin header.
async fn cors(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return (
            StatusCode::OK,
            [
                (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
                (ACCESS_CONTROL_ALLOW_METHODS, "POST, GET, OPTIONS"),
                (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
            ],
            (),
        )
            .into_response();
    }
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn failure(status: StatusCode, e: &Error) -> Response {
    (status, Json(ErrorEnvelope::from_error(e))).into_response()
}

async fn chat(State(gateway): State<AppState>, body: Bytes) -> Response {
    // Parsed by hand: a malformed body is a gateway failure (500), not an extractor rejection.
    let req: ChatRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "malformed request body");
            return failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                &Error::Validation(format!("malformed JSON body: {e}")),
            );
        }
    };

    match gateway.handle(&req).await {
        Outcome::Primary(resp) => Json(resp.to_envelope()).into_response(),
        Outcome::Fallback {
            response,
            primary_error,
        } => {
            tracing::info!(primary_error = %primary_error, "served by baseline model");
            Json(response.to_envelope()).into_response()
        }
        Outcome::Failed(e @ Error::Validation(_)) => failure(StatusCode::BAD_REQUEST, &e),
        Outcome::Failed(e) => failure(StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}
