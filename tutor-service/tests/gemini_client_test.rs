use secrecy::Secret;
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use tutor_service::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use tutor_service::services::providers::{ContentInput, ProviderError, TextProvider, UploadedFile};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn provider(server: &MockServer) -> GeminiTextProvider {
    GeminiTextProvider::new(GeminiConfig {
        api_key: Secret::new("test-key".to_string()),
        base_url: server.uri(),
        request_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn text_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn generate_sends_parts_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_json(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "fileData": { "mimeType": "application/pdf", "fileUri": "https://files.example/abc" } },
                    { "text": "Summarize chapter 1" }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("Chapter 1 is about sets.")))
        .expect(1)
        .mount(&server)
        .await;

    let contents = [
        ContentInput::File(UploadedFile {
            name: "files/abc".into(),
            uri: "https://files.example/abc".into(),
            mime_type: "application/pdf".into(),
        }),
        ContentInput::Text("Summarize chapter 1".into()),
    ];

    let answer = provider(&server)
        .generate("gemini-2.0-flash", &contents)
        .await
        .unwrap();

    assert_eq!(answer, "Chapter 1 is about sets.");
}

#[tokio::test]
async fn generate_joins_text_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hello, " }, { "text": "world" }] }
            }]
        })))
        .mount(&server)
        .await;

    let answer = provider(&server)
        .generate("gemini-2.0-flash", &[ContentInput::Text("hi".into())])
        .await
        .unwrap();

    assert_eq!(answer, "Hello, world");
}

#[tokio::test]
async fn rate_limit_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let result = provider(&server)
        .generate("gemini-2.0-flash", &[ContentInput::Text("hi".into())])
        .await;

    assert!(matches!(result, Err(ProviderError::RateLimited)));
}

#[tokio::test]
async fn blocked_prompt_is_content_filtered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let result = provider(&server)
        .generate("gemini-2.0-flash", &[ContentInput::Text("hi".into())])
        .await;

    assert!(matches!(result, Err(ProviderError::ContentFiltered)));
}

#[tokio::test]
async fn missing_candidates_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let result = provider(&server)
        .generate("gemini-2.0-flash", &[ContentInput::Text("hi".into())])
        .await;

    assert!(matches!(result, Err(ProviderError::EmptyResponse)));
}

#[tokio::test]
async fn upload_runs_resumable_session() {
    let server = MockServer::start().await;
    let session_url = format!("{}/upload/session/42", server.uri());

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .and(header("x-goog-api-key", "test-key"))
        .and(header("x-goog-upload-protocol", "resumable"))
        .and(header("x-goog-upload-command", "start"))
        .and(header("x-goog-upload-header-content-type", "application/pdf"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-goog-upload-url", session_url.as_str()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload/session/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": {
                "name": "files/xyz",
                "uri": "https://files.example/xyz",
                "mimeType": "application/pdf"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut local = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    local.write_all(b"%PDF-1.4\n%%EOF\n").unwrap();

    let uploaded = provider(&server)
        .upload_file(local.path(), "application/pdf")
        .await
        .unwrap();

    assert_eq!(
        uploaded,
        UploadedFile {
            name: "files/xyz".into(),
            uri: "https://files.example/xyz".into(),
            mime_type: "application/pdf".into(),
        }
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].body, b"%PDF-1.4\n%%EOF\n".to_vec());
}

#[tokio::test]
async fn upload_without_session_url_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut local = tempfile::NamedTempFile::new().unwrap();
    local.write_all(b"data").unwrap();

    let result = provider(&server)
        .upload_file(local.path(), "application/pdf")
        .await;

    assert!(matches!(result, Err(ProviderError::ApiError(_))));
}

#[tokio::test]
async fn delete_targets_file_resource() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1beta/files/xyz"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    provider(&server).delete_file("files/xyz").await.unwrap();
}

#[tokio::test]
async fn delete_of_unknown_file_is_invalid_request() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1beta/files/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let result = provider(&server).delete_file("files/gone").await;

    assert!(matches!(result, Err(ProviderError::InvalidRequest(_))));
}
