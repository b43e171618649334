//! Persistence for question/answer records.
//!
//! Production storage is a Supabase table reached through its PostgREST API.

use crate::models::{HistoryEntry, NewQaRecord, QaRecord};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use std::time::Duration;

const HISTORY_COLUMNS: &str = "id,question,answer,created_at";

/// Storage for question/answer records.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Insert a record and return it with its store-assigned id.
    async fn insert(&self, record: &NewQaRecord) -> Result<QaRecord, AppError>;

    /// All records of `student_id`, newest first.
    async fn history(&self, student_id: &str) -> Result<Vec<HistoryEntry>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    pub api_key: Secret<String>,
    pub table: String,
    pub request_timeout: Duration,
}

#[derive(Clone)]
pub struct SupabaseDb {
    client: Client,
    table_url: String,
    api_key: Secret<String>,
}

impl SupabaseDb {
    pub fn connect(config: &SupabaseConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let table_url = format!(
            "{}/rest/v1/{}",
            config.url.trim_end_matches('/'),
            config.table
        );
        tracing::info!(table_url = %table_url, "Configured Supabase table endpoint");

        Ok(Self {
            client,
            table_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Attach the PostgREST auth headers.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.api_key.expose_secret();
        request.header("apikey", key).bearer_auth(key)
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response, AppError> {
        let response = self.authorized(request).send().await.map_err(|e| {
            tracing::error!("Failed to {}: {}", action, e);
            AppError::DatabaseError(anyhow::anyhow!(e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Failed to {}", action);
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "Supabase responded {}: {}",
                status,
                body
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl QuestionStore for SupabaseDb {
    async fn insert(&self, record: &NewQaRecord) -> Result<QaRecord, AppError> {
        let request = self
            .client
            .post(&self.table_url)
            .header("Prefer", "return=representation")
            .json(record);

        let rows: Vec<QaRecord> = self
            .send(request, "insert question")
            .await?
            .json()
            .await
            .map_err(|e| {
                tracing::error!("Failed to decode inserted question: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e))
            })?;

        rows.into_iter().next().ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!("insert returned no rows"))
        })
    }

    async fn history(&self, student_id: &str) -> Result<Vec<HistoryEntry>, AppError> {
        let student_filter = format!("eq.{}", student_id);
        let request = self.client.get(&self.table_url).query(&[
            ("select", HISTORY_COLUMNS),
            ("student_id", student_filter.as_str()),
            ("order", "created_at.desc"),
        ]);

        self.send(request, "query history")
            .await?
            .json()
            .await
            .map_err(|e| {
                tracing::error!("Failed to decode history rows: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e))
            })
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let request = self
            .client
            .head(&self.table_url)
            .query(&[("select", "id"), ("limit", "1")]);
        self.send(request, "reach Supabase").await?;
        Ok(())
    }
}
