use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::attempt_policy::AttemptRejection;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    code: &'static str,
    detail: String,
}

/// Every variant has its own `code` in the body, so clients can branch on it
/// even where two kinds share an HTTP status.
#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// Quiz not published, not started yet or already closed.
    Unavailable(String),
    /// Attempt budget used up or attempt deadline passed.
    LimitExceeded(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::Unavailable(_) | Self::LimitExceeded(_) => {
                StatusCode::FORBIDDEN
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::BadRequest(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Unavailable(_) => "unavailable",
            Self::LimitExceeded(_) => "limit_exceeded",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<AttemptRejection> for ApiError {
    fn from(rejection: AttemptRejection) -> Self {
        match rejection {
            AttemptRejection::NotPublished
            | AttemptRejection::NotStarted
            | AttemptRejection::Ended => Self::Unavailable(rejection.to_string()),
            AttemptRejection::MaxAttemptsReached | AttemptRejection::DeadlinePassed => {
                Self::LimitExceeded(rejection.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        match &self {
            ApiError::ServiceUnavailable(message) => {
                tracing::warn!(error = %message, "Service unavailable");
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
            }
            _ => {}
        }

        let bearer_challenge = matches!(self, ApiError::Unauthorized(_));
        let detail = match self {
            ApiError::Unauthorized(message) | ApiError::Forbidden(message) => message.to_string(),
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::Unavailable(message)
            | ApiError::LimitExceeded(message)
            | ApiError::ServiceUnavailable(message)
            | ApiError::Internal(message) => message,
        };

        let mut response =
            (status, Json(ErrorResponse { status: status.as_u16(), code, detail })).into_response();
        if bearer_challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
