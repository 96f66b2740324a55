//! Verification status lookups with expiry and caching.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::observability::metrics;
use crate::verification::store::{StoreError, VerificationRecord, VerificationStore};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("user id must be a 0x-prefixed 20-byte hex address")]
    InvalidUserId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl VerificationError {
    /// Stable code returned to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::InvalidUserId => "INVALID_USER_ID_FORMAT",
            VerificationError::Store(_) => "VERIFICATION_LOOKUP_FAILED",
        }
    }
}

/// Check `^0x[a-fA-F0-9]{40}$` and return the lowercase form.
pub fn validate_user_id(raw: &str) -> Result<String, VerificationError> {
    let hex = raw.strip_prefix("0x").ok_or(VerificationError::InvalidUserId)?;
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(VerificationError::InvalidUserId);
    }
    Ok(raw.to_ascii_lowercase())
}

/// Status reported for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatus {
    pub status: String,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_expired: Option<bool>,
}

impl VerificationStatus {
    fn not_found() -> Self {
        Self {
            status: "not_found".to_string(),
            verified: false,
            timestamp: None,
            is_expired: None,
        }
    }
}

/// Resolves addresses to a [`VerificationStatus`].
pub struct VerificationService {
    store: Arc<dyn VerificationStore>,
    cache: Arc<TtlCache<String, VerificationRecord>>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
    cache_ttl: Duration,
}

impl VerificationService {
    pub fn new(
        store: Arc<dyn VerificationStore>,
        cache: Arc<TtlCache<String, VerificationRecord>>,
        max_age_days: u64,
        cache_ttl: Duration,
    ) -> Self {
        Self::with_clock(store, cache, max_age_days, cache_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn VerificationStore>,
        cache: Arc<TtlCache<String, VerificationRecord>>,
        max_age_days: u64,
        cache_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            max_age: Duration::from_secs(max_age_days.saturating_mul(SECS_PER_DAY)),
            cache_ttl,
        }
    }

    pub fn cache(&self) -> &Arc<TtlCache<String, VerificationRecord>> {
        &self.cache
    }

    /// Look up the status for a raw, unvalidated address.
    pub async fn status(&self, raw_user_id: &str) -> Result<VerificationStatus, VerificationError> {
        let user_id = validate_user_id(raw_user_id)?;

        let record = match self.cache.get(&user_id) {
            Some(record) => Some(record),
            None => {
                let found = self.store.find(&user_id).await.inspect_err(|e| {
                    tracing::error!(user_id = %user_id, error = %e, "Verification store lookup failed");
                    metrics::record_verification_lookup("error");
                })?;
                if let Some(record) = found.as_ref().filter(|r| r.verified) {
                    self.cache.set(user_id.clone(), record.clone(), Some(self.cache_ttl));
                }
                found
            }
        };

        let status = match record {
            Some(record) => self.evaluate(&record),
            None => VerificationStatus::not_found(),
        };
        let outcome = match (status.verified, status.is_expired) {
            (_, Some(true)) => "expired",
            (true, _) => "verified",
            (false, None) => "not_found",
            (false, _) => "unverified",
        };
        metrics::record_verification_lookup(outcome);
        tracing::debug!(user_id = %user_id, outcome, "Verification lookup");
        Ok(status)
    }

    fn evaluate(&self, record: &VerificationRecord) -> VerificationStatus {
        let age = self.clock.now_secs().saturating_sub(record.verified_at);
        if age > self.max_age.as_secs() {
            return VerificationStatus {
                status: "expired".to_string(),
                verified: false,
                timestamp: Some(record.verified_at),
                is_expired: Some(true),
            };
        }
        VerificationStatus {
            status: record.status.clone(),
            verified: record.verified,
            timestamp: Some(record.verified_at),
            is_expired: Some(false),
        }
    }
}

impl std::fmt::Debug for VerificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationService")
            .field("max_age", &self.max_age)
            .field("cache_ttl", &self.cache_ttl)
            .field("cached", &self.cache.len())
            .finish()
    }
}
