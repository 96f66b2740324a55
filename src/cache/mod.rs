//! Client-side style caching.
//!
//! In-memory map with per-entry TTL checked at read time, optionally mirrored
//! to a JSON file so entries survive a restart.

pub mod clock;
pub mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl::TtlCache;
