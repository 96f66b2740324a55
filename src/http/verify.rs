use axum::{
    extract::{Path, State},
    Json,
};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::verification::VerificationStatus;

/// `GET /verify/status/{address}`
pub async fn verification_status(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<VerificationStatus>, ApiError> {
    let status = state.verification.status(&address).await?;
    Ok(Json(status))
}
