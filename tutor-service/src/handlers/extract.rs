//! Extractors whose rejections render as `AppError` (400) instead of
//! axum's plain-text 415/422 responses.

use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::Json;
use service_core::error::AppError;

#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);
