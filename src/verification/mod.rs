//! Verification status subsystem.
//!
//! ```text
//! GET /verify/status/{address}
//!     → service.rs (validate, lowercase, cache, expiry)
//!     → store.rs (memory or Supabase)
//! ```

pub mod service;
pub mod store;

pub use service::{validate_user_id, VerificationError, VerificationService, VerificationStatus};
pub use store::{MemoryStore, StoreError, SupabaseStore, VerificationRecord, VerificationStore};
