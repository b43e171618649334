#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use service_core::config::Config as CoreConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tutor_service::config::TutorConfig;
use tutor_service::services::providers::mock::MockTextProvider;
use tutor_service::services::{DocumentFetcher, InMemoryDb};
use tutor_service::startup::{build_router, AppState};

pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\n%%EOF\n";

pub fn test_config() -> TutorConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("GEMINI_API_KEY", "test-gemini-key"),
        ("SUPABASE_URL", "http://supabase.invalid"),
        ("SUPABASE_KEY", "test-supabase-key"),
    ]);
    let common = CoreConfig { port: 0 };
    TutorConfig::from_lookup(common, |key| vars.get(key).map(|v| v.to_string()))
        .expect("test configuration should load")
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub provider: Arc<MockTextProvider>,
    pub store: Arc<InMemoryDb>,
}

impl TestApp {
    pub fn new(provider: MockTextProvider, store: InMemoryDb) -> Self {
        let provider = Arc::new(provider);
        let store = Arc::new(store);
        let state = AppState {
            config: test_config(),
            store: store.clone(),
            provider: provider.clone(),
            fetcher: DocumentFetcher::new(Duration::from_secs(5))
                .expect("fetcher should build"),
        };

        TestApp {
            router: build_router(state.clone()),
            state,
            provider,
            store,
        }
    }

    /// App whose model always answers `reply` and whose store works.
    pub fn replying(reply: &str) -> Self {
        Self::new(MockTextProvider::replying(reply), InMemoryDb::new())
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }
}

/// Stand-in for object storage issuing pre-signed URLs.
pub struct DocumentServer {
    pub base_url: String,
}

impl DocumentServer {
    pub async fn spawn() -> Self {
        let app = Router::new()
            .route(
                "/signed/notes.pdf",
                get(|| async { ([(header::CONTENT_TYPE, "application/pdf")], PDF_BYTES) }),
            )
            .route(
                "/signed/blob",
                get(|| async {
                    ([(header::CONTENT_TYPE, "application/octet-stream")], PDF_BYTES)
                }),
            )
            .route(
                "/signed/expired.pdf",
                get(|| async {
                    (StatusCode::FORBIDDEN, "Request has expired").into_response()
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        DocumentServer {
            base_url: format!("http://127.0.0.1:{}", port),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
