use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use services::{CatalogError, EssayError, QuizError, StatsError};

/// A request failure, rendered as `{ "success": false, "error": … }` with a
/// matching status code. Nothing here is fatal to the process.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        }
        let body = Json(json!({
            "success": false,
            "error": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        let status = match &err {
            QuizError::NoAreaSelected | QuizError::InvalidOption(_) => StatusCode::BAD_REQUEST,
            QuizError::NoQuestionsFound
            | QuizError::NoActiveSession
            | QuizError::IndexOutOfRange { .. }
            | QuizError::QuestionNotFound(_)
            | QuizError::QuestionNotInSession(_) => StatusCode::NOT_FOUND,
            QuizError::AlreadyAnswered => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<EssayError> for ApiError {
    fn from(err: EssayError) -> Self {
        let status = match &err {
            EssayError::MissingInput => StatusCode::BAD_REQUEST,
            EssayError::HttpStatus(_) | EssayError::Http(_) | EssayError::MalformedReply(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}
