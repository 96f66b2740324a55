//! Backends holding verification records.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// Environment variable carrying the Supabase service key.
pub const SUPABASE_KEY_ENV: &str = "DROPS_SUPABASE_KEY";

/// A stored verification outcome for one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Lowercase `0x` address.
    pub user_id: String,
    pub verified: bool,
    pub status: String,
    /// Unix seconds.
    pub verified_at: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("store answered with status {0}")]
    Status(u16),

    #[error("failed to read seed file: {0}")]
    Seed(#[from] std::io::Error),

    #[error("malformed seed file: {0}")]
    SeedFormat(#[from] serde_json::Error),
}

/// Lookup by lowercase address.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn find(&self, user_id: &str) -> Result<Option<VerificationRecord>, StoreError>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<String, VerificationRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of records.
    pub fn from_seed_file(path: &Path) -> Result<Self, StoreError> {
        let reader = BufReader::new(File::open(path)?);
        let records: Vec<VerificationRecord> = serde_json::from_reader(reader)?;
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        tracing::info!(path = ?path, records = store.records.len(), "Seeded verification store");
        Ok(store)
    }

    /// Insert a record, normalizing its key to lowercase.
    pub fn insert(&self, mut record: VerificationRecord) {
        record.user_id = record.user_id.to_ascii_lowercase();
        self.records.insert(record.user_id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn find(&self, user_id: &str) -> Result<Option<VerificationRecord>, StoreError> {
        Ok(self.records.get(user_id).map(|r| r.value().clone()))
    }
}

/// Supabase (PostgREST) table store.
pub struct SupabaseStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl SupabaseStore {
    pub fn new(client: reqwest::Client, base_url: &str, table: &str, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            tracing::warn!(env = SUPABASE_KEY_ENV, "Supabase key not set, requests are anonymous");
        }
        Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key,
        }
    }

    /// Build from the process environment.
    pub fn from_env(client: reqwest::Client, base_url: &str, table: &str) -> Self {
        Self::new(client, base_url, table, std::env::var(SUPABASE_KEY_ENV).ok())
    }

    fn request(&self, user_id: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("limit", "1".to_string()),
            ]);
        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key).bearer_auth(key);
        }
        builder
    }
}

impl std::fmt::Debug for SupabaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStore")
            .field("endpoint", &self.endpoint)
            .field("authenticated", &self.api_key.is_some())
            .finish()
    }
}

#[async_trait]
impl VerificationStore for SupabaseStore {
    async fn find(&self, user_id: &str) -> Result<Option<VerificationRecord>, StoreError> {
        let response = self.request(user_id).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Supabase lookup failed");
            return Err(StoreError::Status(status.as_u16()));
        }
        let rows: Vec<VerificationRecord> = response.json().await?;
        Ok(rows.into_iter().next())
    }
}
