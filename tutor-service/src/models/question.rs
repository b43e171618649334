//! Question/answer records persisted to the `questions` table.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A stored question/answer pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaRecord {
    /// Store-assigned identifier (uuid or bigint column).
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub student_id: String,
    pub project_id: String,
    pub question: String,
    pub answer: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Row to insert; the store assigns `id`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewQaRecord {
    pub student_id: String,
    pub project_id: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl NewQaRecord {
    pub fn new(student_id: String, project_id: String, question: String, answer: String) -> Self {
        Self {
            student_id,
            project_id,
            question,
            answer,
            created_at: Utc::now(),
        }
    }
}

/// Projection returned by the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl From<QaRecord> for HistoryEntry {
    fn from(record: QaRecord) -> Self {
        Self {
            id: record.id,
            question: record.question,
            answer: record.answer,
            created_at: record.created_at,
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Accepts `timestamptz` output and naive `timestamp` output (read as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}
