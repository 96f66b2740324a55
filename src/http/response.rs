//! JSON error responses.
//!
//! Client mistakes are 4xx with an `error_code`; failures of a third-party
//! call are 500 with `{error, details}`. Handlers never panic on either.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::referral::ReferralError;
use crate::verification::VerificationError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, message: String },
    MethodNotAllowed { allow: &'static str },
    Upstream { error: &'static str, details: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest { code, message } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": message, "error_code": code })),
            )
                .into_response(),
            ApiError::MethodNotAllowed { allow } => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, allow)],
                Json(json!({ "error": "Method not allowed" })),
            )
                .into_response(),
            ApiError::Upstream { error, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error, "details": details })),
            )
                .into_response(),
        }
    }
}

impl From<ReferralError> for ApiError {
    fn from(err: ReferralError) -> Self {
        match err.code() {
            Some(code) => ApiError::BadRequest {
                code,
                message: err.to_string(),
            },
            None => ApiError::Upstream {
                error: "Failed to submit referral",
                details: err.details(),
            },
        }
    }
}

impl From<VerificationError> for ApiError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::InvalidUserId => ApiError::BadRequest {
                code: err.code(),
                message: err.to_string(),
            },
            VerificationError::Store(e) => ApiError::Upstream {
                error: "Failed to fetch verification status",
                details: e.to_string(),
            },
        }
    }
}
