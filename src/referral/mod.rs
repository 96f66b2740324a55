//! Referral-attribution proxy.
//!
//! Validates `{txHash, chainId}` submissions and forwards them to the
//! third-party referral API. The upstream JSON is passed back untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReferralError {
    #[error("request body is not valid JSON: {0}")]
    InvalidBody(String),

    #[error("txHash and chainId are required")]
    MissingFields,

    #[error("txHash must be a 0x-prefixed 32-byte hex string")]
    InvalidTxHash,

    #[error("chainId must be a positive integer")]
    InvalidChainId,

    #[error("referral API request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("referral API answered {status}")]
    UpstreamStatus { status: u16, body: String },
}

impl ReferralError {
    /// Code for client errors; `None` for upstream failures.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ReferralError::InvalidBody(_) => Some("INVALID_BODY"),
            ReferralError::MissingFields => Some("MISSING_FIELDS"),
            ReferralError::InvalidTxHash => Some("INVALID_TX_HASH"),
            ReferralError::InvalidChainId => Some("INVALID_CHAIN_ID"),
            ReferralError::Upstream(_) | ReferralError::UpstreamStatus { .. } => None,
        }
    }

    /// Detail string exposed alongside a 500.
    pub fn details(&self) -> String {
        match self {
            ReferralError::UpstreamStatus { status, body } if !body.is_empty() => {
                format!("upstream status {}: {}", status, body)
            }
            other => other.to_string(),
        }
    }
}

/// Body forwarded to the referral API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSubmission {
    pub tx_hash: String,
    pub chain_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubmission {
    tx_hash: Option<String>,
    chain_id: Option<Value>,
}

impl ReferralSubmission {
    /// Parse and validate a request body. `chainId` may be a number or a
    /// decimal string.
    pub fn parse(body: &[u8]) -> Result<Self, ReferralError> {
        let raw: RawSubmission =
            serde_json::from_slice(body).map_err(|e| ReferralError::InvalidBody(e.to_string()))?;
        let (Some(tx_hash), Some(chain_id)) = (raw.tx_hash, raw.chain_id) else {
            return Err(ReferralError::MissingFields);
        };
        if tx_hash.is_empty() {
            return Err(ReferralError::MissingFields);
        }

        let hex = tx_hash.strip_prefix("0x").ok_or(ReferralError::InvalidTxHash)?;
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ReferralError::InvalidTxHash);
        }

        let chain_id = match chain_id {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse::<u64>().ok(),
            Value::Null => return Err(ReferralError::MissingFields),
            _ => None,
        }
        .filter(|id| *id > 0)
        .ok_or(ReferralError::InvalidChainId)?;

        Ok(Self { tx_hash, chain_id })
    }
}

/// Forwards submissions to the referral API.
#[derive(Debug, Clone)]
pub struct ReferralClient {
    client: reqwest::Client,
}

impl ReferralClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Submit to `api_url` and return the upstream JSON body.
    pub async fn submit(&self, api_url: &str, submission: &ReferralSubmission) -> Result<Value, ReferralError> {
        let response = self.client.post(api_url).json(submission).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReferralError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}
