//! Document fetcher for attachments referenced by pre-signed URLs.
//!
//! The document is streamed into a named temporary file that is removed when
//! the returned [`DownloadedDocument`] is dropped or closed.

use futures::StreamExt;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode, Url};
use std::path::Path;
use std::time::Duration;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

/// Used when the server does not report a specific content type.
pub const DEFAULT_DOCUMENT_MIME_TYPE: &str = "application/pdf";

const TEMP_FILE_PREFIX: &str = "tutor-doc-";
const TEMP_FILE_SUFFIX: &str = ".pdf";

/// Error type for document fetching operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with {0}")]
    Status(StatusCode),

    #[error("failed to write temporary file: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Whether the failure is attributable to the supplied URL (bad, expired,
    /// unreachable) rather than to this service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, FetchError::Io(_))
    }
}

/// A downloaded document living in a temporary file.
#[derive(Debug)]
pub struct DownloadedDocument {
    path: TempPath,
    mime_type: String,
    size: u64,
}

impl DownloadedDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Delete the temporary file now, logging a failure instead of returning it.
    pub fn remove(self) {
        let shown = self.path.display().to_string();
        match self.path.close() {
            Ok(()) => tracing::info!(path = %shown, "Deleted local temporary file"),
            Err(e) => tracing::warn!(
                path = %shown,
                error = %e,
                "Failed to delete local temporary file"
            ),
        }
    }
}

/// Downloads attachments over HTTP(S).
#[derive(Clone)]
pub struct DocumentFetcher {
    client: Client,
}

impl DocumentFetcher {
    pub fn new(request_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client })
    }

    /// Download `url` into a fresh temporary file.
    pub async fn fetch(&self, url: &str) -> Result<DownloadedDocument, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        // Acquire the temp file first; every later exit path drops `path`.
        let (file, path) = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(TEMP_FILE_SUFFIX)
            .tempfile()?
            .into_parts();

        tracing::info!(
            host = url.host_str().unwrap_or("-"),
            path = %path.display(),
            "Downloading document from pre-signed URL"
        );

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(document_mime_type)
            .unwrap_or_else(|| DEFAULT_DOCUMENT_MIME_TYPE.to_string());

        let mut out = tokio::fs::File::from_std(file);
        let mut size = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            size += chunk.len() as u64;
            out.write_all(&chunk).await?;
        }
        out.flush().await?;

        tracing::info!(
            path = %path.display(),
            size = size,
            mime_type = %mime_type,
            "Document downloaded"
        );

        Ok(DownloadedDocument {
            path,
            mime_type,
            size,
        })
    }
}

/// Media type from a `Content-Type` value, ignoring generic binary types.
fn document_mime_type(header: &str) -> Option<String> {
    let essence = header.split(';').next()?.trim().to_ascii_lowercase();
    match essence.as_str() {
        "" | "application/octet-stream" | "binary/octet-stream" => None,
        _ => Some(essence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_drops_parameters() {
        assert_eq!(
            document_mime_type("text/plain; charset=utf-8"),
            Some("text/plain".to_string())
        );
        assert_eq!(
            document_mime_type("Application/PDF"),
            Some("application/pdf".to_string())
        );
    }

    #[test]
    fn generic_binary_types_fall_back() {
        assert_eq!(document_mime_type("application/octet-stream"), None);
        assert_eq!(document_mime_type("binary/octet-stream"), None);
        assert_eq!(document_mime_type(""), None);
    }

    #[tokio::test]
    async fn rejects_malformed_and_non_http_urls() {
        let fetcher = DocumentFetcher::new(Duration::from_secs(5)).unwrap();

        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert!(err.is_client_error());

        let err = fetcher.fetch("file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[test]
    fn remove_deletes_temporary_file() {
        let path = tempfile::Builder::new()
            .suffix(TEMP_FILE_SUFFIX)
            .tempfile()
            .unwrap()
            .into_temp_path();
        let on_disk = path.to_path_buf();
        assert!(on_disk.exists());

        let document = DownloadedDocument {
            path,
            mime_type: DEFAULT_DOCUMENT_MIME_TYPE.to_string(),
            size: 0,
        };
        document.remove();

        assert!(!on_disk.exists());
    }

    #[test]
    fn io_errors_are_server_side() {
        let err = FetchError::Io(std::io::Error::other("disk full"));
        assert!(!err.is_client_error());
    }
}
