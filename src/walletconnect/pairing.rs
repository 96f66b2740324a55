//! Pairing client seam.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::walletconnect::uri::PairingUri;

#[derive(Debug, Error)]
pub enum PairingError {
    #[error("no pairing service configured")]
    NotConfigured,

    #[error("pairing URI has expired")]
    Expired,

    #[error("pairing request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("pairing service answered {0}")]
    Rejected(u16),
}

/// Establishes a pairing for a URI.
#[async_trait]
pub trait PairingClient: Send + Sync {
    async fn pair(&self, uri: &PairingUri) -> Result<(), PairingError>;
}

#[derive(Serialize)]
struct PairRequest<'a> {
    uri: &'a str,
}

/// Posts `{uri}` to a pairing service.
#[derive(Debug, Clone)]
pub struct HttpPairingClient {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl HttpPairingClient {
    pub fn new(client: reqwest::Client, endpoint: Option<String>) -> Self {
        if endpoint.is_none() {
            tracing::warn!("walletconnect.pairing_url not set, pairing requests will fail");
        }
        Self { client, endpoint }
    }
}

#[async_trait]
impl PairingClient for HttpPairingClient {
    async fn pair(&self, uri: &PairingUri) -> Result<(), PairingError> {
        let endpoint = self.endpoint.as_deref().ok_or(PairingError::NotConfigured)?;
        let response = self
            .client
            .post(endpoint)
            .json(&PairRequest { uri: uri.as_str() })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PairingError::Rejected(status.as_u16()));
        }
        tracing::info!(topic = %uri.topic(), "Pairing established");
        Ok(())
    }
}
