//! Startup orchestration.
//!
//! Builds the shared server state from a validated config: outbound HTTP
//! client, network registry, verification store and cache, pairing client.
//! Any failure here is fatal.

use arc_swap::ArcSwap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::config::{DropsConfig, VerificationBackend};
use crate::http::server::AppState;
use crate::referral::ReferralClient;
use crate::verification::{MemoryStore, StoreError, SupabaseStore, VerificationService, VerificationStore};
use crate::walletconnect::HttpPairingClient;

/// Name the verification cache reports in metrics.
pub const VERIFICATION_CACHE: &str = "verification";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to open verification store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to load cache mirror: {0}")]
    Cache(#[from] std::io::Error),
}

/// Build handler state from `config`.
pub fn build_state(config: DropsConfig) -> Result<AppState, StartupError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeouts.upstream_secs))
        .user_agent(concat!("faucet-drops/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let registry = Arc::new(config.registry());

    let store: Arc<dyn VerificationStore> = match config.verification.backend {
        VerificationBackend::Memory => match &config.verification.seed_path {
            Some(path) => Arc::new(MemoryStore::from_seed_file(Path::new(path))?),
            None => Arc::new(MemoryStore::new()),
        },
        VerificationBackend::Supabase => Arc::new(SupabaseStore::from_env(
            client.clone(),
            &config.verification.supabase_url,
            &config.verification.supabase_table,
        )),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = match &config.cache.persistence_path {
        Some(path) => TtlCache::load_from_file(VERIFICATION_CACHE, Path::new(path), clock.clone())?,
        None => TtlCache::with_clock(VERIFICATION_CACHE, clock.clone()),
    };

    let verification = VerificationService::with_clock(
        store,
        Arc::new(cache),
        config.verification.max_age_days,
        Duration::from_secs(config.verification.cache_ttl_secs),
        clock.clone(),
    );
    let pairing = HttpPairingClient::new(client.clone(), config.walletconnect.pairing_url.clone());

    tracing::info!(
        networks = registry.len(),
        backend = ?config.verification.backend,
        "Server state initialized"
    );

    Ok(AppState {
        config: Arc::new(ArcSwap::from_pointee(config)),
        registry,
        referral: ReferralClient::new(client),
        verification: Arc::new(verification),
        pairing: Arc::new(pairing),
        clock,
    })
}
