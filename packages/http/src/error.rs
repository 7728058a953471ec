use http::StatusCode;

use docfs_store::{Error as StoreError, ErrorKind, PathError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("Request body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Method {method} is not supported")]
    MethodNotAllowed { method: http::Method },

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<PathError> for Error {
    fn from(error: PathError) -> Self {
        Error::Store(StoreError::from(error))
    }
}

impl Error {
    /// The status a client sees for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Store(error) => match error.kind() {
                ErrorKind::Client => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::NotAllowed => StatusCode::METHOD_NOT_ALLOWED,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Error::InvalidHeaderValue(_) | Error::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
