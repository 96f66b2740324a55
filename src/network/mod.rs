//! Supported networks and the active-network context.
//!
//! # Data Flow
//! ```text
//! registry.rs (static descriptors, built at startup)
//!     → context.rs (active network, switch requests to the wallet)
//!     → wallet::context (enforcement, provider chain events)
//! ```

pub mod context;
pub mod registry;

pub use context::NetworkContext;
pub use registry::{NativeCurrency, NetworkDescriptor, NetworkRegistry};
