//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    domain::IdentityError,
    infrastructure::dto::http::ErrorResponse,
    usecase::{HistoryError, SendMessageError},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Forbidden {
        message: String,
        reason: Option<String>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let reason = match &self {
            Self::Forbidden { reason, .. } => reason.clone(),
            _ => None,
        };
        let body = ErrorResponse {
            message: self.to_string(),
            reason,
        };
        (status, Json(body)).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::MissingCredential => Self::Unauthorized("No token provided".to_string()),
            IdentityError::InvalidCredential => Self::Unauthorized("Invalid token".to_string()),
            IdentityError::UnknownUser(_) => Self::NotFound("User not found".to_string()),
            IdentityError::Banned { reason, .. } => Self::Forbidden {
                message: "Access denied. Your account has been banned.".to_string(),
                reason: Some(reason),
            },
            IdentityError::Repository(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<SendMessageError> for ApiError {
    fn from(error: SendMessageError) -> Self {
        let message = error.client_message().to_string();
        match error {
            SendMessageError::Validation(_) => Self::BadRequest(message),
            SendMessageError::ReceiverNotFound(_) => Self::NotFound(message),
            SendMessageError::Persistence(_) => Self::Internal(message),
        }
    }
}

impl From<HistoryError> for ApiError {
    fn from(error: HistoryError) -> Self {
        match error {
            HistoryError::Validation(e) => Self::BadRequest(e),
            HistoryError::Persistence(_) => Self::Internal("Failed to fetch messages".to_string()),
        }
    }
}
