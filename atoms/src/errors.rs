use lambda_http::http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Every way a course-file operation can be refused.
///
/// The `Display` text is the human readable message the client shows
/// verbatim, so keep it short and addressed to the user.
#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Locked(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage failure: {0}")]
    Store(String),
}

impl ApprovalError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "Forbidden",
            Self::InvalidState(_) => "InvalidState",
            Self::Locked(_) => "Locked",
            Self::InvalidInput(_) => "InvalidInput",
            Self::NotFound(_) => "NotFound",
            Self::Conflict(_) => "Conflict",
            Self::Store(_) => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidState(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Locked(_) => StatusCode::LOCKED,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApprovalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(id) => Self::Conflict(format!(
                "Task {} was changed by someone else. Reload and try again.",
                id
            )),
            StoreError::AlreadyExists(what) => Self::InvalidState(format!("{} already exists.", what)),
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApprovalError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(format!("Invalid request body: {}", err))
    }
}
