pub mod analysis;
pub mod questions;

pub use analysis::{AnalysisOperation, AnalyzeAnswerRequest, AnalyzeAnswerResponse};
pub use questions::{AskQuestionRequest, AskQuestionResponse, DbSaveStatus, HistoryParams};
