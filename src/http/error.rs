//! Error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::access::gate::AccessDenied;
use crate::serve::range::RangeError;
use crate::upload::ingest::{IngestError, UploadRejection};

/// Every failure a handler can surface, with its wire mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    #[error("malformed range: {0}")]
    MalformedRange(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("file not found")]
    NotFound,

    #[error(transparent)]
    UploadRejected(#[from] UploadRejection),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AccessDenied(AccessDenied::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::AccessDenied(_) => StatusCode::FORBIDDEN,
            ApiError::MalformedRange(_) | ApiError::BadRequest(_) | ApiError::UploadRejected(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::AccessDenied(AccessDenied::RateLimited) => "Rate limit exceeded".to_string(),
            ApiError::AccessDenied(_) => "Access denied".to_string(),
            ApiError::NotFound => "File not found".to_string(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        }
        (status, body).into_response()
    }
}

impl From<RangeError> for ApiError {
    fn from(err: RangeError) -> Self {
        ApiError::MalformedRange(err.to_string())
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            // A body that does not parse as multipart is the client's
            // doing.
            IngestError::Multipart(e) => ApiError::BadRequest(e.to_string()),
            IngestError::Io(e) => ApiError::Internal(format!("failed to persist upload: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::AccessDenied(AccessDenied::NetworkNotAllowed).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::AccessDenied(AccessDenied::InvalidAddress).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::AccessDenied(AccessDenied::RateLimited).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(RangeError::Malformed).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RangeError::Unsatisfiable { size: 10 }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::UploadRejected(UploadRejection::EmptyFilename).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn rejection_message_names_the_limit() {
        let err = ApiError::UploadRejected(UploadRejection::FileTooLarge { size: 200, max: 100 });
        assert_eq!(
            err.to_string(),
            "file too large: 200 bytes exceeds limit of 100"
        );
    }
}
