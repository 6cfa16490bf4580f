use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use campusguessr_game::{AuthError, DatabaseError, RoundError};
use log::error;
use thiserror::Error;

use crate::serialized::UploadResult;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("There are no photos to play with")]
    NoPhotos,
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NoPhotos => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.as_status_code();

        match self {
            Self::Unknown(message) => {
                error!("Request failed: {}", message);
                (status, "Internal server error").into_response()
            }
            e => (status, e.to_string()).into_response(),
        }
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        Self::Unknown(value.to_string())
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        Self::Unknown(value.to_string())
    }
}

impl From<RoundError> for ServerError {
    fn from(value: RoundError) -> Self {
        match value {
            RoundError::NoPhotos => Self::NoPhotos,
            RoundError::Db(e) => e.into(),
        }
    }
}

/// Everything that can go wrong when uploading a score.
/// Storage failures are logged and hidden from the caller.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("{0}")]
    MalformedInput(String),
    #[error("Score could not be saved")]
    Storage(#[source] DatabaseError),
}

impl UploadError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::MalformedInput(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        if let Self::Storage(e) = &self {
            error!("Failed to store score: {}", e);
        }

        let status = self.as_status_code();
        (status, Json(UploadResult::failed(self.to_string()))).into_response()
    }
}

impl From<DatabaseError> for UploadError {
    fn from(value: DatabaseError) -> Self {
        Self::Storage(value)
    }
}
