//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DropsConfig (validated, immutable)
//!     → shared via ArcSwap with the HTTP handlers
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and validates
//!     → mpsc channel to the server
//!     → atomic swap of the shared config
//! ```
//!
//! Listener, store and registry settings are read once at startup; handlers
//! pick up referral and WalletConnect settings from the swapped config.

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CacheConfig, DropsConfig, ListenerConfig, ObservabilityConfig, ReferralConfig, TimeoutConfig,
    VerificationBackend, VerificationConfig, WalletConfig, WalletConnectConfig,
};
pub use validation::ValidationError;
