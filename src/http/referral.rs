use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde_json::Value;

use crate::http::request::RequestIdExt;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::referral::ReferralSubmission;

/// `POST /api/referral`
pub async fn submit_referral(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let submission = ReferralSubmission::parse(&body).inspect_err(|e| {
        tracing::debug!(request_id = %headers.request_id(), error = %e, "Rejected referral body");
        metrics::record_referral("invalid");
    })?;

    let api_url = state.config.load().referral.api_url.clone();
    match state.referral.submit(&api_url, &submission).await {
        Ok(upstream) => {
            tracing::info!(
                request_id = %headers.request_id(),
                chain_id = submission.chain_id,
                tx_hash = %submission.tx_hash,
                "Referral submitted"
            );
            metrics::record_referral("submitted");
            Ok(Json(upstream))
        }
        Err(e) => {
            tracing::error!(
                request_id = %headers.request_id(),
                chain_id = submission.chain_id,
                error = %e,
                "Referral submission failed"
            );
            metrics::record_referral("failed");
            Err(e.into())
        }
    }
}

/// Any other method on `/api/referral`.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed { allow: "POST" }
}
