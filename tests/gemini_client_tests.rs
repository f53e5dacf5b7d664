use emotion_reply_backend::config::Config;
use emotion_reply_backend::message::ReplyResponse;
use emotion_reply_backend::routes::create_router;
use emotion_reply_backend::services::generator::{GeminiClient, TextGenerator};
use emotion_reply_backend::state::AppState;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::util::ServiceExt;

#[derive(Debug, Clone)]
struct SeenRequest {
    path: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<SeenRequest>>>);

impl Seen {
    fn all(&self) -> Vec<SeenRequest> {
        self.0.lock().unwrap().clone()
    }
}

// Answers like generateContent: key "k1" is accepted, "k-empty" gets no candidates,
// anything else is rejected.
async fn fake_gemini(State(seen): State<Seen>, uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.0.lock().unwrap().push(SeenRequest {
        path: uri.path().to_string(),
        api_key: api_key.clone(),
        body,
    });

    match api_key.as_deref() {
        Some("k1") => Json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "You got this"}]},
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
        Some("k-empty") => Json(json!({"candidates": []})).into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"code": 401, "message": "API key not valid", "status": "UNAUTHENTICATED"}})),
        )
            .into_response(),
    }
}

async fn spawn_fake_gemini() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new().fallback(fake_gemini).with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), seen)
}

fn config_for(base: &str, api_key: &str) -> Config {
    let base = base.to_string();
    let api_key = api_key.to_string();
    Config::from_lookup(move |name| match name {
        "GEMINI_API_BASE" => Some(base.clone()),
        "GEMINI_API_KEY" => Some(api_key.clone()),
        "UPSTREAM_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn test_sends_prompt_and_key_to_fixed_model() {
    let (base, seen) = spawn_fake_gemini().await;
    let client = GeminiClient::from_config(&config_for(&base, "k1")).unwrap();

    let text = client.generate("hello prompt").await.unwrap();
    assert_eq!(text, "You got this");

    let requests = seen.all();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/v1beta/models/gemini-1.5-flash:generateContent");
    assert_eq!(requests[0].api_key.as_deref(), Some("k1"));
    assert_eq!(
        requests[0].body,
        json!({"contents": [{"role": "user", "parts": [{"text": "hello prompt"}]}]})
    );
}

#[tokio::test]
async fn test_rejected_key_is_auth_error() {
    let (base, seen) = spawn_fake_gemini().await;
    let client = GeminiClient::from_config(&config_for(&base, "wrong")).unwrap();

    let err = client.generate("hello prompt").await.unwrap_err();
    assert_eq!(err.kind(), "AuthError");
    assert!(!err.is_retryable());
    assert_eq!(seen.all().len(), 1);
}

#[tokio::test]
async fn test_no_candidates_is_upstream_error() {
    let (base, _seen) = spawn_fake_gemini().await;
    let client = GeminiClient::from_config(&config_for(&base, "k-empty")).unwrap();

    let err = client.generate("hello prompt").await.unwrap_err();
    assert_eq!(err.kind(), "UpstreamError");
}

#[tokio::test]
async fn test_get_reply_through_real_client() {
    let (base, seen) = spawn_fake_gemini().await;
    let config = config_for(&base, "k1");
    let client = GeminiClient::from_config(&config).unwrap();
    let state = Arc::new(AppState::new(&config, Arc::new(client)));
    let app = create_router().with_state(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/get-reply")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"emotion": "sad"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let reply: ReplyResponse = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(reply.reply, "You got this");

    let prompt = seen.all()[0].body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(prompt.starts_with("The user looks sad."));
}
