use axum::{
    extract::{Query, State},
    http::{header, HeaderName, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::time::Duration;

use crate::http::server::AppState;
use crate::walletconnect::{self, PairingQuery, Redirect};

pub const REFRESH: HeaderName = HeaderName::from_static("refresh");

/// `GET /wc`
pub async fn walletconnect_redirect(
    State(state): State<AppState>,
    Query(query): Query<PairingQuery>,
) -> Response {
    let (home, delay) = {
        let config = state.config.load();
        (
            config.walletconnect.home_path.clone(),
            Duration::from_secs(config.walletconnect.redirect_delay_secs),
        )
    };

    match walletconnect::resolve(
        query.action(),
        state.pairing.as_ref(),
        state.clock.as_ref(),
        &home,
        delay,
    ).await {
        Redirect::Immediate(location) => {
            (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response()
        }
        Redirect::Delayed { location, delay } => (
            StatusCode::OK,
            [(REFRESH, format!("{}; url={}", delay.as_secs(), location))],
            Html("<!doctype html><title>Paired</title><p>Wallet paired. Redirecting&hellip;</p>"),
        )
            .into_response(),
    }
}
