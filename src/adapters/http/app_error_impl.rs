use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::UnresolvedAccount(_) => StatusCode::CONFLICT,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::SyncIncomplete(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::UnsupportedEvent(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log the error before it gets converted into a status response.
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        // Internal details stay in the logs
        let message = match self {
            AppError::UnresolvedAccount(msg)
            | AppError::SyncIncomplete(msg)
            | AppError::Authentication(msg)
            | AppError::UnsupportedEvent(msg)
            | AppError::MalformedEvent(msg)
            | AppError::InvalidInput(msg) => Some(msg),
            _ => None,
        };

        error_resp(status, code, message)
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
