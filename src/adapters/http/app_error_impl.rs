use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        let code = self.code();
        match self {
            // Recoverable: the event is already recorded, the caller should
            // treat this as success rather than retry.
            AppError::DuplicateEvent(msg) => {
                error_resp(StatusCode::CONFLICT, code, Some(msg))
            }
            AppError::UnknownTier(_) => {
                error_resp(StatusCode::BAD_REQUEST, code, Some(self.to_string()))
            }
            AppError::InsufficientBalance { .. } => {
                error_resp(StatusCode::BAD_REQUEST, code, Some(self.to_string()))
            }
            AppError::InstantPayoutIneligible => {
                error_resp(StatusCode::BAD_REQUEST, code, None)
            }
            AppError::ProcessorUnavailable(_) => {
                error_resp(StatusCode::SERVICE_UNAVAILABLE, code, None)
            }
            AppError::Integrity(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None)
            }
            AppError::Database(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None)
            }
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, code, Some(msg))
            }
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, code, None),
            AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None)
            }
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
