//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request id, tracing, timeout, body limit, metrics)
//! - Swap in reloaded configuration
//! - Serve until the shutdown broadcast fires

use arc_swap::ArcSwap;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::cache::Clock;
use crate::config::DropsConfig;
use crate::http::{networks, pairing, referral, request, verify};
use crate::lifecycle::shutdown;
use crate::network::NetworkRegistry;
use crate::referral::ReferralClient;
use crate::verification::VerificationService;
use crate::walletconnect::PairingClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Hot-reloadable configuration.
    pub config: Arc<ArcSwap<DropsConfig>>,
    pub registry: Arc<NetworkRegistry>,
    pub referral: ReferralClient,
    pub verification: Arc<VerificationService>,
    pub pairing: Arc<dyn PairingClient>,
    pub clock: Arc<dyn Clock>,
}

/// Build the router with all middleware layers.
#[allow(deprecated)]
pub fn router(state: AppState) -> Router {
    let (request_timeout, body_limit) = {
        let config = state.config.load();
        (
            Duration::from_secs(config.timeouts.request_secs),
            config.listener.max_body_bytes,
        )
    };

    Router::new()
        .route(
            "/api/referral",
            post(referral::submit_referral).fallback(referral::method_not_allowed),
        )
        .route("/verify/status/{address}", get(verify::verification_status))
        .route("/wc", get(pairing::walletconnect_redirect))
        .route("/networks", get(networks::list_networks))
        .route("/health", get(networks::health))
        .route_layer(middleware::from_fn(request::track_metrics))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(request::propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request::set_request_id_layer())
}

/// HTTP server for the FaucetDrops backend.
pub struct HttpServer {
    router: Router,
    config: Arc<ArcSwap<DropsConfig>>,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self {
            router: router(state),
            config,
        }
    }

    /// Run until `shutdown` fires. Reloaded configs arriving on
    /// `config_updates` are swapped in for the handlers.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: Option<mpsc::UnboundedReceiver<DropsConfig>>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let Some(updates) = config_updates {
            tokio::spawn(apply_config_updates(self.config.clone(), updates));
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> Arc<DropsConfig> {
        self.config.load_full()
    }
}

async fn apply_config_updates(
    current: Arc<ArcSwap<DropsConfig>>,
    mut updates: mpsc::UnboundedReceiver<DropsConfig>,
) {
    while let Some(next) = updates.recv().await {
        let previous = current.load();
        if previous.listener.bind_address != next.listener.bind_address
            || previous.networks != next.networks
            || previous.verification.backend != next.verification.backend
        {
            tracing::warn!("Listener, network and store changes take effect on restart");
        }
        current.store(Arc::new(next));
        tracing::info!("Configuration reloaded");
    }
}
