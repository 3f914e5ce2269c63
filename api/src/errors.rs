//! HTTP error family
//!
//! Every error renders as `{"detail": "<message>"}`.

use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use thiserror::Error;

use wu_core::errors::messages;
use wu_core::{AuthError, ServiceError};
use wu_shared::ErrorResponse;

/// Message used when an error is raised without one
pub const DEFAULT_MESSAGE: &str = messages::SERVICE_UNAVAILABLE;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Login(String),

    #[error("{0}")]
    EntityDoesNotExist(String),

    #[error("{0}")]
    EntityAlreadyExists(String),

    #[error("{0}")]
    InvalidToken(String),

    #[error("{0}")]
    InvalidCredentials(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    pub fn login() -> Self {
        Self::Login(DEFAULT_MESSAGE.into())
    }

    pub fn entity_does_not_exist() -> Self {
        Self::EntityDoesNotExist(DEFAULT_MESSAGE.into())
    }

    pub fn entity_already_exists() -> Self {
        Self::EntityAlreadyExists(DEFAULT_MESSAGE.into())
    }

    pub fn invalid_token() -> Self {
        Self::InvalidToken(DEFAULT_MESSAGE.into())
    }

    pub fn invalid_credentials() -> Self {
        Self::InvalidCredentials(DEFAULT_MESSAGE.into())
    }

    pub fn service() -> Self {
        Self::Service(ServiceError::new(DEFAULT_MESSAGE))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::CouldNotValidate => Self::InvalidToken(err.to_string()),
            other => {
                tracing::error!(error = %other, "Auth helper failed");
                Self::Service(ServiceError::new(DEFAULT_MESSAGE).with_source(other))
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Login(_) => StatusCode::UNAUTHORIZED,
            ApiError::EntityDoesNotExist(_) => StatusCode::NOT_FOUND,
            ApiError::EntityAlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            ApiError::Service(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if matches!(self, ApiError::InvalidToken(_)) {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(ErrorResponse::new(self.to_string()))
    }
}
