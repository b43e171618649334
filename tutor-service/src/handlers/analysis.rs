use crate::dtos::{AnalysisOperation, AnalyzeAnswerRequest, AnalyzeAnswerResponse};
use crate::handlers::extract::JsonBody;
use crate::services::metrics;
use crate::services::providers::ContentInput;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

/// `POST /analyze_answer/`
///
/// Summarizes or explains a previously generated answer.
pub async fn analyze_answer(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AnalyzeAnswerRequest>,
) -> Result<Json<AnalyzeAnswerResponse>, AppError> {
    let operation: AnalysisOperation = request.operation.parse().map_err(|_| {
        tracing::warn!(operation = %request.operation, "Rejected unknown analysis operation");
        AppError::BadRequest(anyhow::anyhow!("Invalid operation type."))
    })?;

    let prompt = operation.prompt(&request.answer_text);

    let result = state
        .provider
        .generate(&state.config.gemini.analysis_model, &[ContentInput::Text(prompt)])
        .await
        .map_err(|e| {
            metrics::record_analysis(operation.as_str(), "error");
            AppError::internal(format!("Failed to perform {}.", operation), e)
        })?;

    metrics::record_analysis(operation.as_str(), "success");

    Ok(Json(AnalyzeAnswerResponse { operation, result }))
}
