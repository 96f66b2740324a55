//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (required chain exists in the registry)
//! - Validate value ranges and URLs
//!
//! Returns every error found, not just the first.

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{DropsConfig, VerificationBackend};

/// A single semantic problem in the config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid URL for {field}: '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("required chain {0} is not in the network registry")]
    UnsupportedRequiredChain(u64),

    #[error("chain {0} appears more than once in [[networks]]")]
    DuplicateChainId(u64),

    #[error("verification backend 'supabase' needs verification.supabase_url")]
    MissingSupabaseUrl,

    #[error("walletconnect.home_path must start with '/', got '{0}'")]
    InvalidHomePath(String),
}

/// Validate a parsed config.
pub fn validate_config(config: &DropsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    for (field, value) in [
        ("listener.max_body_bytes", config.listener.max_body_bytes as u64),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("wallet.poll_interval_ms", config.wallet.poll_interval_ms),
        ("verification.max_age_days", config.verification.max_age_days),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    check_url(&mut errors, "referral.api_url", &config.referral.api_url);
    check_url(&mut errors, "wallet.rpc_url", &config.wallet.rpc_url);
    if let Some(url) = &config.walletconnect.pairing_url {
        check_url(&mut errors, "walletconnect.pairing_url", url);
    }
    if config.verification.backend == VerificationBackend::Supabase {
        if config.verification.supabase_url.is_empty() {
            errors.push(ValidationError::MissingSupabaseUrl);
        } else {
            check_url(&mut errors, "verification.supabase_url", &config.verification.supabase_url);
        }
    }
    if !config.walletconnect.home_path.starts_with('/') {
        errors.push(ValidationError::InvalidHomePath(config.walletconnect.home_path.clone()));
    }

    let mut seen = HashSet::new();
    for network in &config.networks {
        if !seen.insert(network.chain_id) {
            errors.push(ValidationError::DuplicateChainId(network.chain_id));
        }
    }
    if !config.registry().contains(config.wallet.required_chain_id) {
        errors.push(ValidationError::UnsupportedRequiredChain(config.wallet.required_chain_id));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if url::Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
