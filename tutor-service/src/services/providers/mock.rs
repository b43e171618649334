//! Mock provider implementation for testing.
//!
//! Records every call so tests can assert on what reached the backend.

use super::{ContentInput, ProviderError, TextProvider, UploadedFile};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// A call received by [`MockTextProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Upload {
        path: PathBuf,
        mime_type: String,
        /// Bytes read from `path` at upload time.
        size: u64,
    },
    Generate {
        model: String,
        contents: Vec<ContentInput>,
    },
    Delete {
        name: String,
    },
}

/// Mock text provider for testing.
pub struct MockTextProvider {
    reply: String,
    fail_upload: bool,
    fail_generate: bool,
    fail_delete: bool,
    calls: Mutex<Vec<ProviderCall>>,
}

impl MockTextProvider {
    /// A provider that answers every generation with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            fail_upload: false,
            fail_generate: false,
            fail_delete: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    pub fn failing_generation(mut self) -> Self {
        self.fail_generate = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub async fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().await.clone()
    }

    pub async fn generate_calls(&self) -> Vec<(String, Vec<ContentInput>)> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                ProviderCall::Generate { model, contents } => {
                    Some((model.clone(), contents.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub async fn uploaded_paths(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                ProviderCall::Upload { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn deleted_files(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                ProviderCall::Delete { name } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        model: &str,
        contents: &[ContentInput],
    ) -> Result<String, ProviderError> {
        self.calls.lock().await.push(ProviderCall::Generate {
            model: model.to_string(),
            contents: contents.to_vec(),
        });

        if self.fail_generate {
            return Err(ProviderError::ApiError("mock generation failure".to_string()));
        }

        Ok(self.reply.clone())
    }

    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
    ) -> Result<UploadedFile, ProviderError> {
        let size = tokio::fs::metadata(path).await?.len();

        let mut calls = self.calls.lock().await;
        calls.push(ProviderCall::Upload {
            path: path.to_path_buf(),
            mime_type: mime_type.to_string(),
            size,
        });

        if self.fail_upload {
            return Err(ProviderError::ApiError("mock upload failure".to_string()));
        }

        let id = calls.len();
        Ok(UploadedFile {
            name: format!("files/mock-{}", id),
            uri: format!("https://mock.invalid/files/mock-{}", id),
            mime_type: mime_type.to_string(),
        })
    }

    async fn delete_file(&self, name: &str) -> Result<(), ProviderError> {
        self.calls.lock().await.push(ProviderCall::Delete {
            name: name.to_string(),
        });

        if self.fail_delete {
            return Err(ProviderError::ApiError("mock delete failure".to_string()));
        }

        Ok(())
    }
}
