//! In-memory question store for tests and local runs without Supabase.

use super::database::QuestionStore;
use crate::models::{HistoryEntry, NewQaRecord, QaRecord};
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryDb {
    records: RwLock<Vec<QaRecord>>,
    next_id: AtomicU64,
    fail_inserts: bool,
    fail_queries: bool,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<QaRecord>) -> Self {
        let next_id = records.len() as u64;
        Self {
            records: RwLock::new(records),
            next_id: AtomicU64::new(next_id),
            ..Self::default()
        }
    }

    /// Every insert fails with a database error.
    pub fn failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    /// Every history query (and health check) fails with a database error.
    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    pub async fn records(&self) -> Vec<QaRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl QuestionStore for InMemoryDb {
    async fn insert(&self, record: &NewQaRecord) -> Result<QaRecord, AppError> {
        if self.fail_inserts {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "in-memory store rejects inserts"
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = QaRecord {
            id: id.to_string(),
            student_id: record.student_id.clone(),
            project_id: record.project_id.clone(),
            question: record.question.clone(),
            answer: record.answer.clone(),
            created_at: record.created_at,
        };

        self.records.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn history(&self, student_id: &str) -> Result<Vec<HistoryEntry>, AppError> {
        if self.fail_queries {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "in-memory store rejects queries"
            )));
        }

        let mut matching: Vec<QaRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();

        // Newest first; among equal timestamps the later insert wins.
        matching.reverse();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matching.into_iter().map(HistoryEntry::from).collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        if self.fail_queries {
            return Err(AppError::ServiceUnavailable);
        }
        Ok(())
    }
}
