use axum::http::StatusCode;
use thiserror::Error;

use crate::{
    db::StoreError,
    error::{ErrorMessage, HttpError},
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password hashing error: {0:?}")]
    Hash(ErrorMessage),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ServiceError::BadRequest(message.into())
    }

    pub fn forbidden() -> Self {
        ServiceError::Forbidden(ErrorMessage::PermissionDenied.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Store(_) | ServiceError::Hash(_) | ServiceError::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::BadRequest(message) => HttpError::bad_request(message),
            ServiceError::Unauthorized(message) => HttpError::unauthorized(message),
            ServiceError::Forbidden(message) => HttpError::forbidden(message),
            ServiceError::NotFound(message) => HttpError::not_found(message),
            ServiceError::Conflict(message) => HttpError::conflict(message),
            other => HttpError::server_error(other.to_string()),
        }
    }
}
