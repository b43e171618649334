//! AI provider abstractions and implementations.
//!
//! `TextProvider` is the seam between the handlers and the generative
//! backend: Gemini in production, a recording mock in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to a file stored on the provider side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Resource name used for deletion (e.g. `files/abc123`).
    pub name: String,
    /// URI referenced from generation requests.
    pub uri: String,
    pub mime_type: String,
}

/// One element of a generation request, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentInput {
    Text(String),
    File(UploadedFile),
}

/// Trait for text generation providers with a file store (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate text from the ordered `contents` with `model`.
    async fn generate(&self, model: &str, contents: &[ContentInput])
        -> Result<String, ProviderError>;

    /// Upload a local file so it can be referenced from `generate`.
    async fn upload_file(&self, path: &Path, mime_type: &str)
        -> Result<UploadedFile, ProviderError>;

    /// Delete a previously uploaded file by resource name.
    async fn delete_file(&self, name: &str) -> Result<(), ProviderError>;
}

/// Owns an uploaded file until it is deleted.
///
/// `release` deletes it and waits for the result. A guard dropped without
/// being released (panic, cancelled request) schedules the deletion on the
/// current runtime instead.
pub struct UploadedFileGuard {
    provider: Arc<dyn TextProvider>,
    file: Option<UploadedFile>,
}

impl UploadedFileGuard {
    pub fn new(provider: Arc<dyn TextProvider>, file: UploadedFile) -> Self {
        Self {
            provider,
            file: Some(file),
        }
    }

    pub async fn release(mut self) {
        if let Some(file) = self.file.take() {
            delete_uploaded(self.provider.as_ref(), &file).await;
        }
    }
}

impl Drop for UploadedFileGuard {
    fn drop(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let provider = Arc::clone(&self.provider);
                handle.spawn(async move {
                    delete_uploaded(provider.as_ref(), &file).await;
                });
            }
            Err(_) => {
                tracing::warn!(
                    file_name = %file.name,
                    "No runtime available to delete uploaded file"
                );
            }
        }
    }
}

async fn delete_uploaded(provider: &dyn TextProvider, file: &UploadedFile) {
    match provider.delete_file(&file.name).await {
        Ok(()) => tracing::info!(file_name = %file.name, "Deleted uploaded file from provider"),
        Err(e) => tracing::warn!(
            file_name = %file.name,
            error = %e,
            "Failed to delete uploaded file from provider"
        ),
    }
}
