//! Integration Tests for the backend clients
//!
//! Points the Gemini and Google speech clients at local mock services.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use futures::StreamExt;
use lia_relay::cache::Blob;
use lia_relay::generation::{GeminiClient, GenerationClient, PromptPart};
use lia_relay::speech::{GoogleSpeechClient, SpeechToText, TextToSpeech};
use lia_relay::RelayError;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

// == Helper Functions ==

/// Last request seen by a mock: path, query and JSON body.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Option<(String, HashMap<String, String>, Value)>>>);

impl Captured {
    async fn take(&self) -> (String, HashMap<String, String>, Value) {
        self.0.lock().await.take().expect("mock received no request")
    }
}

async fn spawn_mock(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Mock that records the request and answers with a fixed status and body.
fn mock(
    route: &str,
    captured: Captured,
    status: StatusCode,
    content_type: &'static str,
    body: String,
) -> Router {
    Router::new()
        .route(
            route,
            post(
                move |State(captured): State<Captured>,
                      Path(path): Path<String>,
                      Query(query): Query<HashMap<String, String>>,
                      Json(request): Json<Value>| async move {
                    *captured.0.lock().await = Some((path, query, request));
                    (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
                },
            ),
        )
        .with_state(captured)
}

fn sse_event(text: &str) -> String {
    format!(
        "data: {}\r\n\r\n",
        json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
    )
}

// == Gemini Client Tests ==

#[tokio::test]
async fn test_gemini_streams_fragments() {
    let captured = Captured::default();
    let body = format!(
        "{}{}data: {}\r\n\r\n",
        sse_event("Hola"),
        sse_event(", ¿qué tal?"),
        json!({"candidates": [{"finishReason": "STOP"}], "usageMetadata": {"totalTokenCount": 12}})
    );
    let base = spawn_mock(
        mock("/v1beta/models/*action", captured.clone(), StatusCode::OK, "text/event-stream", body),
    )
    .await;

    let client = GeminiClient::new("test-key", "gemini-test", base);
    let stream = client
        .generate(vec![
            PromptPart::text("CURRENT USER CODE"),
            PromptPart::Image {
                mime_type: "image/png",
                data: Blob::from(vec![0x89u8, 0x50]),
            },
        ])
        .await
        .unwrap();
    let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;

    assert_eq!(fragments, vec!["Hola", ", ¿qué tal?"]);

    let (path, query, request) = captured.take().await;
    assert_eq!(path, "gemini-test:streamGenerateContent");
    assert_eq!(query["alt"], "sse");
    assert_eq!(query["key"], "test-key");
    assert_eq!(request["contents"][0]["parts"][0]["text"], "CURRENT USER CODE");
    assert_eq!(
        request["contents"][0]["parts"][1]["inlineData"]["mimeType"],
        "image/png"
    );
}

#[tokio::test]
async fn test_gemini_http_error_fails_before_streaming() {
    let base = spawn_mock(mock(
        "/v1beta/models/*action",
        Captured::default(),
        StatusCode::TOO_MANY_REQUESTS,
        "application/json",
        json!({"error": {"code": 429, "message": "Resource exhausted"}}).to_string(),
    ))
    .await;

    let client = GeminiClient::new("k", "gemini-test", base);
    let result = client.generate(vec![PromptPart::text("hi")]).await;

    match result {
        Err(RelayError::Generation(message)) => {
            assert!(message.contains("429"));
            assert!(message.contains("Resource exhausted"));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected the request to fail"),
    }
}

#[tokio::test]
async fn test_gemini_error_event_mid_stream() {
    let body = format!(
        "{}data: {}\r\n\r\n",
        sse_event("partial"),
        json!({"error": {"code": 500, "message": "internal"}})
    );
    let base = spawn_mock(mock(
        "/v1beta/models/*action",
        Captured::default(),
        StatusCode::OK,
        "text/event-stream",
        body,
    ))
    .await;

    let client = GeminiClient::new("k", "gemini-test", base);
    let fragments: Vec<_> = client
        .generate(vec![PromptPart::text("hi")])
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0].as_deref().unwrap(), "partial");
    assert!(fragments[1].is_err());
}

// == Speech Client Tests ==

#[tokio::test]
async fn test_transcribe_joins_results() {
    let captured = Captured::default();
    let reply = json!({
        "results": [
            {"alternatives": [{"transcript": "por qué falla", "confidence": 0.93}]},
            {"alternatives": [{"transcript": "este bucle"}]}
        ]
    });
    let base = spawn_mock(mock(
        "/v1/*action",
        captured.clone(),
        StatusCode::OK,
        "application/json",
        reply.to_string(),
    ))
    .await;

    let client = GoogleSpeechClient::new("speech-key").with_base_urls(base.clone(), base);
    let transcript = client.transcribe(&[0, 1, 2, 3]).await.unwrap();

    assert_eq!(transcript, "por qué falla este bucle");
    let (path, query, request) = captured.take().await;
    assert_eq!(path, "speech:recognize");
    assert_eq!(query["key"], "speech-key");
    assert_eq!(request["config"]["languageCode"], "es-419");
    assert_eq!(request["audio"]["content"], "AAECAw==");
}

#[tokio::test]
async fn test_transcribe_service_error() {
    let base = spawn_mock(mock(
        "/v1/*action",
        Captured::default(),
        StatusCode::FORBIDDEN,
        "application/json",
        "{}".to_string(),
    ))
    .await;

    let client = GoogleSpeechClient::new("k").with_base_urls(base.clone(), base);
    let result = client.transcribe(&[0, 1]).await;
    assert!(matches!(result, Err(RelayError::Transcription(_))));
}

#[tokio::test]
async fn test_synthesize_decodes_audio() {
    let captured = Captured::default();
    let base = spawn_mock(mock(
        "/v1/*action",
        captured.clone(),
        StatusCode::OK,
        "application/json",
        json!({"audioContent": "UklGRg=="}).to_string(),
    ))
    .await;

    let client = GoogleSpeechClient::new("tts-key").with_base_urls(base.clone(), base);
    let audio = client.synthesize("Revisa la línea 3").await.unwrap();

    assert_eq!(audio, b"RIFF".to_vec());
    let (path, _, request) = captured.take().await;
    assert_eq!(path, "text:synthesize");
    assert_eq!(request["voice"]["name"], "es-US-Wavenet-A");
    assert_eq!(request["audioConfig"]["audioEncoding"], "LINEAR16");
}

#[tokio::test]
async fn test_synthesize_missing_audio_is_an_error() {
    let base = spawn_mock(mock(
        "/v1/*action",
        Captured::default(),
        StatusCode::OK,
        "application/json",
        "{}".to_string(),
    ))
    .await;

    let client = GoogleSpeechClient::new("k").with_base_urls(base.clone(), base);
    let result = client.synthesize("hola").await;
    assert!(matches!(result, Err(RelayError::Synthesis(_))));
}
