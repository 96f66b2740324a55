//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML config
//! file. Every section has defaults so a minimal (or empty) file works.

use serde::{Deserialize, Serialize};

use crate::network::registry::{NetworkDescriptor, NetworkRegistry};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DropsConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Wallet connection settings.
    pub wallet: WalletConfig,

    /// Referral-attribution proxy.
    pub referral: ReferralConfig,

    /// Verification status lookups.
    pub verification: VerificationConfig,

    /// Verification cache mirror.
    pub cache: CacheConfig,

    /// WalletConnect pairing redirect.
    pub walletconnect: WalletConnectConfig,

    /// Replaces the built-in network registry when non-empty.
    pub networks: Vec<NetworkDescriptor>,
}

impl DropsConfig {
    /// Network registry described by this config.
    pub fn registry(&self) -> NetworkRegistry {
        if self.networks.is_empty() {
            NetworkRegistry::builtin()
        } else {
            NetworkRegistry::from_descriptors(self.networks.clone())
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for an inbound request in seconds.
    pub request_secs: u64,

    /// Outbound calls to third-party services in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Include event targets in log lines.
    pub log_targets: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_targets: true,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Wallet connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// The single chain the dApp runs on.
    pub required_chain_id: u64,

    /// JSON-RPC endpoint the CLI connects its wallet adapter to.
    pub rpc_url: String,

    /// Polling interval for account/chain notifications in milliseconds.
    pub poll_interval_ms: u64,

    /// Timeout for a single poll in seconds.
    pub poll_timeout_secs: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            required_chain_id: 42220,
            rpc_url: "http://localhost:8545".to_string(),
            poll_interval_ms: 4000,
            poll_timeout_secs: 5,
        }
    }
}

/// Referral-attribution proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReferralConfig {
    /// Third-party endpoint receiving `{txHash, chainId}`.
    pub api_url: String,
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.divvi.xyz/submitReferral".to_string(),
        }
    }
}

/// Where verification records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationBackend {
    /// In-process map, optionally seeded from `seed_path`.
    #[default]
    Memory,
    /// Supabase PostgREST table.
    Supabase,
}

/// Verification status lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub backend: VerificationBackend,

    /// Records older than this are reported as expired.
    pub max_age_days: u64,

    /// How long a found record is served from cache, in seconds.
    pub cache_ttl_secs: u64,

    /// JSON array of records loaded into the memory backend.
    pub seed_path: Option<String>,

    /// Supabase project URL.
    pub supabase_url: String,

    /// Table holding verification records.
    pub supabase_table: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            backend: VerificationBackend::Memory,
            max_age_days: 90,
            cache_ttl_secs: 300,
            seed_path: None,
            supabase_url: String::new(),
            supabase_table: "verifications".to_string(),
        }
    }
}

/// Cache mirror configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// JSON file the verification cache is mirrored to. Disabled when unset.
    pub persistence_path: Option<String>,
}

/// WalletConnect pairing redirect configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConnectConfig {
    /// Service that performs the pairing. Pairing fails when unset.
    pub pairing_url: Option<String>,

    /// Delay before the client is sent home after a successful pairing.
    pub redirect_delay_secs: u64,

    /// Route the handler redirects to.
    pub home_path: String,
}

impl Default for WalletConnectConfig {
    fn default() -> Self {
        Self {
            pairing_url: None,
            redirect_delay_secs: 2,
            home_path: "/".to_string(),
        }
    }
}
