use axum::extract::FromRequest;

use super::response::ApiError;

/// `Json` with rejections rendered as [`ApiError`]: malformed bodies become
/// 400 `validation_error`, oversized ones 413 `payload_too_large`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
