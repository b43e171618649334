use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AskQuestionRequest {
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "project_id must not be empty"))]
    pub project_id: String,
    #[validate(length(min = 1, message = "question must not be empty"))]
    pub question: String,
    /// Pre-signed download URL of the attached document.
    #[serde(default)]
    pub file_path: Option<String>,
}

impl AskQuestionRequest {
    /// The document URL, if one was supplied. Blank values count as absent.
    pub fn document_url(&self) -> Option<&str> {
        self.file_path
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DbSaveStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AskQuestionResponse {
    pub question: String,
    pub answer: String,
    pub student_id: String,
    pub project_id: String,
    pub db_save_status: DbSaveStatus,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub student_id: String,
}
