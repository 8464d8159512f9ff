use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::post::ledger::LedgerError;

#[derive(Debug, Error)]
pub enum CustomError {
    #[error("Unauthorized: {0}")]
    UnauthorizedError(String),

    #[error("Forbidden: {0}")]
    ForbiddenError(String),

    /// Caller does not own the comment. Sent as a 401.
    #[error("Forbidden: {0}")]
    NotOwnerError(String),

    #[error("Bad Request: {0}")]
    BadRequestError(String),

    #[error("Conflict: {0}")]
    ConflictError(String),

    #[error("Too Many Requests: {0}")]
    TooManyRequestsError(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Not Found: {0}")]
    NotFoundError(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),
}

impl CustomError {
    pub fn kind(&self) -> &'static str {
        match *self {
            CustomError::UnauthorizedError(..) => "UNAUTHORIZED_ERROR",
            CustomError::ForbiddenError(..) | CustomError::NotOwnerError(..) => "FORBIDDEN_ERROR",
            CustomError::BadRequestError(..) => "BAD_REQUEST_ERROR",
            CustomError::ConflictError(..) => "CONFLICT_ERROR",
            CustomError::TooManyRequestsError(..) => "TOO_MANY_REQUESTS_ERROR",
            CustomError::InternalServerError(..) => "INTERNAL_SERVER_ERROR",
            CustomError::NotFoundError(..) => "NOT_FOUND_ERROR",
            CustomError::ValidationError(..) => "VALIDATION_ERROR",
        }
    }
}

/// Service name echoed in every JSON envelope.
pub fn service_name() -> String {
    std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string())
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match *self {
            CustomError::UnauthorizedError(..) => StatusCode::UNAUTHORIZED,
            CustomError::ForbiddenError(..) => StatusCode::FORBIDDEN,
            CustomError::NotOwnerError(..) => StatusCode::UNAUTHORIZED,
            CustomError::BadRequestError(..) => StatusCode::BAD_REQUEST,
            CustomError::ConflictError(..) => StatusCode::CONFLICT,
            CustomError::TooManyRequestsError(..) => StatusCode::TOO_MANY_REQUESTS,
            CustomError::InternalServerError(..) => StatusCode::INTERNAL_SERVER_ERROR,
            CustomError::NotFoundError(..) => StatusCode::NOT_FOUND,
            CustomError::ValidationError(..) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let CustomError::InternalServerError(msg) = self {
            log::error!("{}", msg);
        }

        let error_message = json!({
            "success": false,
            "message": self.to_string(),
            "httpStatusCode": self.status_code().as_u16(),
            "error": self.kind(),
            "service": service_name(),
        });

        HttpResponse::build(self.status_code()).json(error_message)
    }
}

impl From<mongodb::error::Error> for CustomError {
    fn from(err: mongodb::error::Error) -> Self {
        CustomError::InternalServerError(format!("Database error: {}", err))
    }
}

impl From<LedgerError> for CustomError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidVoteType(_) | LedgerError::EmptyComment => {
                CustomError::BadRequestError(err.to_string())
            }
            LedgerError::CommentNotFound => CustomError::NotFoundError(err.to_string()),
            LedgerError::NotCommentAuthor => CustomError::NotOwnerError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn ledger_errors_map_to_http_statuses() {
        let cases = [
            (LedgerError::InvalidVoteType("sideways".into()), StatusCode::BAD_REQUEST),
            (LedgerError::EmptyComment, StatusCode::BAD_REQUEST),
            (LedgerError::CommentNotFound, StatusCode::NOT_FOUND),
            (LedgerError::NotCommentAuthor, StatusCode::UNAUTHORIZED),
        ];

        for (ledger_err, status) in cases {
            let err: CustomError = ledger_err.into();
            assert_eq!(err.status_code(), status);
        }
    }

    #[actix_web::test]
    async fn error_response_uses_json_envelope() {
        let err = CustomError::ConflictError("Post was modified concurrently".into());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["httpStatusCode"], 409);
        assert_eq!(value["error"], "CONFLICT_ERROR");
        assert_eq!(
            value["message"],
            "Conflict: Post was modified concurrently"
        );
    }
}
