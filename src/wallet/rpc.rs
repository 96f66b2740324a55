//! Wallet provider over an EIP-1193 compatible JSON-RPC endpoint.
//!
//! # Responsibilities
//! - Send the wallet methods (`eth_requestAccounts`,
//!   `wallet_switchEthereumChain`, `wallet_addEthereumChain`) over HTTP
//! - Map JSON-RPC error objects to `ProviderError`
//! - Emulate `accountsChanged` / `chainChanged` by polling
//!
//! Prompt-bearing requests carry no timeout. Only the background polls do.

use alloy::primitives::Address;
use alloy::providers::{Provider, RootProvider};
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::borrow::Cow;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::wallet::provider::{AddChainParams, SwitchChainParams, WalletProvider};
use crate::wallet::types::{ProviderError, ProviderEvent, ProviderResult};

/// HTTP JSON-RPC wallet adapter.
#[derive(Clone)]
pub struct RpcWalletProvider {
    provider: RootProvider,
    rpc_url: String,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl RpcWalletProvider {
    /// Create an adapter for `rpc_url`.
    ///
    /// No request is sent until the first call.
    pub fn connect(rpc_url: &str, poll_interval: Duration, poll_timeout: Duration) -> ProviderResult<Self> {
        let url: url::Url = rpc_url.parse().map_err(|e| {
            ProviderError::Transport(format!("Invalid RPC URL '{}': {}", rpc_url, e))
        })?;
        Ok(Self {
            provider: RootProvider::new_http(url),
            rpc_url: rpc_url.to_string(),
            poll_interval,
            poll_timeout,
        })
    }

    /// `eth_accounts`: permitted accounts without prompting.
    pub async fn accounts(&self) -> ProviderResult<Vec<Address>> {
        self.provider
            .raw_request::<_, Vec<Address>>(Cow::Borrowed("eth_accounts"), ())
            .await
            .map_err(map_transport_error)
    }

    async fn poll_events(self, tx: mpsc::UnboundedSender<ProviderEvent>) {
        let mut last_accounts = self.poll(self.accounts()).await;
        let mut last_chain = self.poll(self.chain_id()).await;
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break;
            }

            if let Some(accounts) = self.poll(self.accounts()).await {
                if last_accounts.as_ref() != Some(&accounts) {
                    if tx.send(ProviderEvent::AccountsChanged(accounts.clone())).is_err() {
                        break;
                    }
                    last_accounts = Some(accounts);
                }
            }

            if let Some(chain_id) = self.poll(self.chain_id()).await {
                if last_chain != Some(chain_id) {
                    if tx.send(ProviderEvent::ChainChanged(chain_id)).is_err() {
                        break;
                    }
                    last_chain = Some(chain_id);
                }
            }
        }
        tracing::debug!(rpc_url = %self.rpc_url, "Provider poller stopped");
    }

    async fn poll<T>(&self, fut: impl std::future::Future<Output = ProviderResult<T>>) -> Option<T> {
        match timeout(self.poll_timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                tracing::warn!(rpc_url = %self.rpc_url, error = %e, "Provider poll failed");
                None
            }
            Err(_) => {
                tracing::warn!(rpc_url = %self.rpc_url, "Provider poll timed out");
                None
            }
        }
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
        self.provider
            .raw_request::<_, Vec<Address>>(Cow::Borrowed("eth_requestAccounts"), ())
            .await
            .map_err(map_transport_error)
    }

    async fn chain_id(&self) -> ProviderResult<u64> {
        self.provider.get_chain_id().await.map_err(map_transport_error)
    }

    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
        self.provider
            .raw_request::<_, serde_json::Value>(
                Cow::Borrowed("wallet_switchEthereumChain"),
                (SwitchChainParams::new(chain_id),),
            )
            .await
            .map(|_| ())
            .map_err(map_transport_error)
    }

    async fn add_chain(&self, params: AddChainParams) -> ProviderResult<()> {
        self.provider
            .raw_request::<_, serde_json::Value>(Cow::Borrowed("wallet_addEthereumChain"), (params,))
            .await
            .map(|_| ())
            .map_err(map_transport_error)
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<ProviderEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(self.clone().poll_events(tx));
        rx
    }
}

impl std::fmt::Debug for RpcWalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcWalletProvider")
            .field("rpc_url", &self.rpc_url)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Map an alloy transport error to the provider taxonomy.
pub fn map_transport_error(err: TransportError) -> ProviderError {
    match err.as_error_resp() {
        Some(payload) => ProviderError::from_code(payload.code, payload.message.to_string()),
        None => ProviderError::Transport(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url() {
        let result = RpcWalletProvider::connect("not a url", Duration::from_secs(1), Duration::from_secs(1));
        assert!(matches!(result, Err(ProviderError::Transport(msg)) if msg.contains("Invalid RPC URL")));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Nothing listens on port 1.
        let provider =
            RpcWalletProvider::connect("http://127.0.0.1:1", Duration::from_secs(1), Duration::from_secs(1))
                .unwrap();
        let err = provider.request_accounts().await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
