//! Wallet connection subsystem.
//!
//! # Data Flow
//! ```text
//! Wallet provider (injected wallet / JSON-RPC endpoint)
//!     → provider.rs (narrow capability trait)
//!     → rpc.rs (alloy adapter, polling-based notifications)
//!     → context.rs (async shell: connect, disconnect, event pump)
//!     → machine.rs (single update entry point, switch tokens)
//!     → enforcement.rs (required-chain rule)
//! ```
//!
//! # Constraints
//! - Wallet prompts have no timeout; they resolve when the user answers
//! - Provider notifications are applied in emission order
//! - Only the latest switch request's resolution is honored

pub mod context;
pub mod enforcement;
pub mod machine;
pub mod provider;
pub mod rpc;
pub mod types;

pub use context::WalletContext;
pub use enforcement::NetworkEnforcement;
pub use machine::{ConnectionMachine, ConnectionPhase, ConnectionState};
pub use provider::{AddChainParams, WalletProvider};
pub use rpc::RpcWalletProvider;
pub use types::{ProviderError, ProviderEvent, SwitchError, WalletError};
