use advisor_core::{ChatRequest, Error};
use advisor_local::GatewayClient;
use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> GatewayClient {
    GatewayClient::new(
        reqwest::Client::new(),
        &format!("http://{addr}"),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn posts_gateway_body_and_reads_primary_envelope() {
    let seen: Arc<Mutex<Option<serde_json::Value>>> = Arc::new(Mutex::new(None));
    let app = Router::new().route(
        "/api/chat",
        post({
            let seen = seen.clone();
            move |Json(body): Json<serde_json::Value>| {
                let seen = seen.clone();
                async move {
                    *seen.lock().unwrap() = Some(body);
                    Json(json!({
                        "response": "Use the serum at night.",
                        "webSearchResults": [{"url": "https://example.test"}],
                        "hasWebSearch": true
                    }))
                }
            }
        }),
    );
    let addr = serve(app).await;

    let req = ChatRequest::new("When do I apply serum?")
        .with_selected_items(["Revitalift Serum"])
        .with_focus_area("cheeks")
        .with_concern("aging");
    let resp = client(addr).send_prompt(&req).await.unwrap();
    assert_eq!(resp.text, "Use the serum at night.");
    assert!(resp.used_primary_model);
    assert_eq!(
        resp.search_results,
        Some(json!([{"url": "https://example.test"}]))
    );

    let body = seen.lock().unwrap().clone().unwrap();
    assert_eq!(
        body,
        json!({
            "message": "When do I apply serum?",
            "products": ["Revitalift Serum"],
            "faceArea": "cheeks",
            "concern": "aging"
        })
    );
}

#[tokio::test]
async fn fallback_envelope_maps_to_baseline_response() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async { Json(json!({"response": "Try X", "hasWebSearch": false})) }),
    );
    let addr = serve(app).await;

    let resp = client(addr)
        .send_prompt(&ChatRequest::new("Help with dry skin").with_concern("dryness"))
        .await
        .unwrap();
    assert_eq!(resp.text, "Try X");
    assert!(!resp.used_primary_model);
    assert_eq!(resp.search_results, None);
}

#[tokio::test]
async fn gateway_500_is_request_failed_with_details() {
    let calls = Arc::new(Mutex::new(0u32));
    let app = Router::new().route(
        "/api/chat",
        post({
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    *calls.lock().unwrap() += 1;
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "error": "Sorry, I encountered an error. Please try again.",
                            "details": "fallback model unavailable: HTTP 500"
                        })),
                    )
                }
            }
        }),
    );
    let addr = serve(app).await;

    let err = client(addr)
        .send_prompt(&ChatRequest::new("hi"))
        .await
        .unwrap_err();
    match err {
        Error::RequestFailed { status, message } => {
            assert_eq!(status, Some(500));
            assert_eq!(message, "fallback model unavailable: HTTP 500");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // The client never retries on its own.
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn malformed_success_body_is_request_failed() {
    let app = Router::new().route("/api/chat", post(|| async { "<html>oops</html>" }));
    let addr = serve(app).await;

    let err = client(addr)
        .send_prompt(&ChatRequest::new("hi"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::RequestFailed { status: Some(200), .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn unreachable_gateway_is_request_failed_without_status() {
    // Bind then drop to get a port nobody is listening on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr)
        .send_prompt(&ChatRequest::new("hi"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::RequestFailed { status: None, .. }),
        "{err:?}"
    );
}
