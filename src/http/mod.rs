//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request id, metrics)
//!     → handler: referral.rs | verify.rs | pairing.rs | networks.rs
//!     → response.rs (JSON errors)
//!     → Send to client
//! ```

pub mod networks;
pub mod pairing;
pub mod referral;
pub mod request;
pub mod response;
pub mod server;
pub mod verify;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{router, AppState, HttpServer};
