use axum::http::StatusCode;

/// One-line user-facing notice with an HTTP status. Every handler failure
/// is folded into this at the controller boundary; nothing propagates
/// further and nothing is retried.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Failures of the local persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not open the local data file: {0}")]
    Unavailable(#[source] std::io::Error),
    #[error("could not decode the local data file: {0}")]
    Read(#[source] serde_json::Error),
    #[error("could not save data: {0}")]
    Write(#[source] std::io::Error),
    #[error("could not encode data: {0}")]
    Encode(#[source] serde_json::Error),
}
