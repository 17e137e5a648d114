use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use docqa_core::config::GenerationConfig;
use docqa_core::traits::Generator;
use docqa_core::types::GenerationRequest;
use docqa_rag::OllamaGenerator;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn generator(addr: SocketAddr, timeout_secs: f64) -> OllamaGenerator {
    let config = GenerationConfig { base_url: format!("http://{}/", addr), timeout_secs, ..GenerationConfig::default() };
    OllamaGenerator::new(&config).expect("client")
}

fn request() -> GenerationRequest {
    GenerationRequest {
        system_instruction: "answer from documents".into(),
        context: "Duty-free allowance is 600 USD.".into(),
        query: "What is the duty-free allowance?".into(),
    }
}

#[tokio::test]
async fn chat_request_shape_and_verbatim_content() {
    let app = Router::new().route(
        "/api/chat",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["model"], "llama3:8b");
            assert_eq!(body["stream"], false);
            assert_eq!(body["messages"][0]["role"], "system");
            assert_eq!(body["messages"][1]["role"], "user");
            let user = body["messages"][1]["content"].as_str().unwrap_or_default().to_string();
            assert!(user.contains("[Question]"));
            let content = if user.contains("600 USD") { "  The allowance is 600 USD.\n" } else { "unknown" };
            Json(json!({"model": "llama3:8b", "message": {"role": "assistant", "content": content}, "done": true}))
        }),
    );
    let addr = serve(app).await;
    let text = generator(addr, 5.0).generate(&request()).await.expect("answer");
    assert_eq!(text, "  The allowance is 600 USD.\n");
}

#[tokio::test]
async fn error_status_is_a_protocol_failure() {
    let app = Router::new().route("/api/chat", post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }));
    let addr = serve(app).await;
    let err = generator(addr, 5.0).generate(&request()).await.unwrap_err();
    assert_eq!(err.kind(), "generation_protocol_failure");
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn malformed_or_incomplete_body_is_a_protocol_failure() {
    let app = Router::new()
        .route("/api/chat", post(|| async { "this is not json" }));
    let addr = serve(app).await;
    let err = generator(addr, 5.0).generate(&request()).await.unwrap_err();
    assert_eq!(err.kind(), "generation_protocol_failure");

    let app = Router::new().route("/api/chat", post(|| async { Json(json!({"message": {"role": "assistant"}})) }));
    let addr = serve(app).await;
    let err = generator(addr, 5.0).generate(&request()).await.unwrap_err();
    assert_eq!(err.kind(), "generation_protocol_failure");
}

#[tokio::test]
async fn refused_connection_is_a_connectivity_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = generator(addr, 5.0).generate(&request()).await.unwrap_err();
    assert_eq!(err.kind(), "generation_connectivity_failure");
}

#[tokio::test]
async fn slow_server_hits_the_client_timeout() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"message": {"content": "late"}}))
        }),
    );
    let addr = serve(app).await;
    let started = std::time::Instant::now();
    let err = generator(addr, 0.2).generate(&request()).await.unwrap_err();
    assert_eq!(err.kind(), "generation_timeout");
    assert!(started.elapsed() < Duration::from_secs(3));
}
