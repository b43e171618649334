use serde::{Deserialize, Serialize};
use std::fmt;

/// Post-processing applied to a previously generated answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisOperation {
    Summarize,
    Explain,
}

impl AnalysisOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisOperation::Summarize => "summarize",
            AnalysisOperation::Explain => "explain",
        }
    }

    /// Instruction sent to the model for `answer_text`.
    pub fn prompt(&self, answer_text: &str) -> String {
        match self {
            AnalysisOperation::Summarize => {
                format!("Summarize the following text concisely:\n\n{}", answer_text)
            }
            AnalysisOperation::Explain => format!(
                "Explain the following answer in simple terms suitable for a student:\n\n{}",
                answer_text
            ),
        }
    }
}

impl fmt::Display for AnalysisOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnalysisOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summarize" => Ok(AnalysisOperation::Summarize),
            "explain" => Ok(AnalysisOperation::Explain),
            _ => Err(format!("Invalid operation type: {}", s)),
        }
    }
}

/// `operation` stays a string here so that unknown values reach the handler
/// and are answered with a 400 rather than a body rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeAnswerRequest {
    pub answer_text: String,
    pub operation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzeAnswerResponse {
    pub operation: AnalysisOperation,
    pub result: String,
}
