use crate::dtos::{AskQuestionRequest, AskQuestionResponse, DbSaveStatus, HistoryParams};
use crate::handlers::extract::{JsonBody, QueryParams};
use crate::models::{HistoryEntry, NewQaRecord};
use crate::services::metrics;
use crate::services::providers::{ContentInput, UploadedFileGuard};
use crate::services::{DownloadedDocument, FetchError};
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;
use std::sync::Arc;
use validator::Validate;

const GENERIC_FAILURE: &str = "Failed to process request or communicate with AI/DB.";
const FILE_PROCESSING_FAILURE: &str = "Internal server error during file processing";

/// `POST /ask_question/`
///
/// Answers a student question, optionally grounded in a document behind a
/// pre-signed URL, and records the pair in the question store. Local and
/// remote copies of the document are removed before the response is sent,
/// whatever the outcome.
///
/// Empty `student_id`, `project_id` or `question` values are rejected with
/// 400 before any download or model call; other strings are accepted as-is.
pub async fn ask_question(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AskQuestionRequest>,
) -> Result<Json<AskQuestionResponse>, AppError> {
    request.validate()?;

    let with_document = request.document_url().is_some();
    let mut document: Option<DownloadedDocument> = None;
    let mut uploaded: Option<UploadedFileGuard> = None;

    let outcome = answer_question(&state, &request, &mut document, &mut uploaded).await;

    if let Some(guard) = uploaded.take() {
        guard.release().await;
    }
    if let Some(document) = document.take() {
        document.remove();
    }

    metrics::record_question(
        with_document,
        if outcome.is_ok() { "success" } else { "error" },
    );

    outcome.map(Json)
}

async fn answer_question(
    state: &AppState,
    request: &AskQuestionRequest,
    document: &mut Option<DownloadedDocument>,
    uploaded: &mut Option<UploadedFileGuard>,
) -> Result<AskQuestionResponse, AppError> {
    let mut contents = Vec::with_capacity(2);

    if let Some(url) = request.document_url() {
        let downloaded = document.insert(state.fetcher.fetch(url).await.map_err(fetch_error)?);

        tracing::info!(
            student_id = %request.student_id,
            size = downloaded.size(),
            "Uploading document to provider"
        );

        let file = state
            .provider
            .upload_file(downloaded.path(), downloaded.mime_type())
            .await
            .map_err(|e| AppError::internal(FILE_PROCESSING_FAILURE, e))?;

        *uploaded = Some(UploadedFileGuard::new(
            Arc::clone(&state.provider),
            file.clone(),
        ));
        contents.push(ContentInput::File(file));
    }

    contents.push(ContentInput::Text(request.question.clone()));

    let answer = state
        .provider
        .generate(&state.config.gemini.question_model, &contents)
        .await
        .map_err(|e| AppError::internal(GENERIC_FAILURE, e))?;

    let record = NewQaRecord::new(
        request.student_id.clone(),
        request.project_id.clone(),
        request.question.clone(),
        answer.clone(),
    );

    // A failed save is reported in the body, never as an HTTP error.
    let db_save_status = match state.store.insert(&record).await {
        Ok(saved) => {
            tracing::info!(
                record_id = %saved.id,
                student_id = %saved.student_id,
                "Saved question and answer"
            );
            DbSaveStatus::Success
        }
        Err(e) => {
            tracing::error!(
                student_id = %request.student_id,
                error = %e,
                "Failed to save question and answer"
            );
            metrics::record_db_save_failure();
            DbSaveStatus::Failure
        }
    };

    Ok(AskQuestionResponse {
        question: request.question.clone(),
        answer,
        student_id: request.student_id.clone(),
        project_id: request.project_id.clone(),
        db_save_status,
    })
}

fn fetch_error(e: FetchError) -> AppError {
    if e.is_client_error() {
        tracing::warn!(error = %e, "Failed to download document");
        AppError::BadRequest(anyhow::anyhow!(
            "Failed to fetch file from URL (check URL validity/expiry): {}",
            e
        ))
    } else {
        AppError::internal(FILE_PROCESSING_FAILURE, e)
    }
}

/// `GET /get_history/?student_id=...`
pub async fn get_history(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<HistoryParams>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let entries = state
        .store
        .history(&params.student_id)
        .await
        .map_err(|e| AppError::internal("Failed to retrieve history log.", e))?;

    tracing::debug!(
        student_id = %params.student_id,
        count = entries.len(),
        "Fetched history"
    );

    Ok(Json(entries))
}
