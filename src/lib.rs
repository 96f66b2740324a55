//! FaucetDrops connection core and service backend.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌────────────────────── connection core ──────────────────────┐
//!   │                                                             │
//!   │  WalletProvider ──events──▶ WalletContext ──▶ ConnectionMachine
//!   │   (wallet::rpc)   (mpsc)      (shell)          (pure, tokens)
//!   │        ▲                        │ SwitchNetwork effect      │
//!   │        └──── switch/add ◀── NetworkContext ◀── NetworkRegistry
//!   └─────────────────────────────────────────────────────────────┘
//!
//!   ┌──────────────────────── service ────────────────────────────┐
//!   │  POST /api/referral          → referral  → third-party API  │
//!   │  GET  /verify/status/{addr}  → verification → cache → store │
//!   │  GET  /wc                    → walletconnect → pairing svc  │
//!   │  GET  /networks, /health                                    │
//!   │                                                             │
//!   │  config (TOML + hot reload), observability, lifecycle       │
//!   └─────────────────────────────────────────────────────────────┘
//! ```

// Connection core
pub mod network;
pub mod wallet;

// Service routes
pub mod cache;
pub mod http;
pub mod referral;
pub mod verification;
pub mod walletconnect;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::DropsConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use network::{NetworkContext, NetworkRegistry};
pub use wallet::WalletContext;
