//! Narrow capability interface over a wallet provider.
//!
//! Everything above this trait is provider-agnostic. Each concrete wallet
//! library gets one adapter implementing it (see `wallet::rpc`).

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::network::registry::{NativeCurrency, NetworkDescriptor};
use crate::wallet::types::{ProviderEvent, ProviderResult};

/// Wallet operations the connection layer depends on.
///
/// Every request may wait on a wallet prompt for as long as the user takes to
/// answer it. Implementations must not add their own timeout to
/// `request_accounts`, `switch_chain` or `add_chain`.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`.
    async fn request_accounts(&self) -> ProviderResult<Vec<Address>>;

    /// `eth_chainId`.
    async fn chain_id(&self) -> ProviderResult<u64>;

    /// `wallet_switchEthereumChain`. Fails with
    /// `ProviderError::UnrecognizedChain` when the wallet lacks the chain.
    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()>;

    /// `wallet_addEthereumChain` (EIP-3085).
    async fn add_chain(&self, params: AddChainParams) -> ProviderResult<()>;

    /// Stream of provider notifications in emission order.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<ProviderEvent>;
}

/// Parameter object for `wallet_switchEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchChainParams {
    pub chain_id: String,
}

impl SwitchChainParams {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id: format!("{:#x}", chain_id),
        }
    }
}

/// Parameter object for `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    /// Hex-encoded chain id with `0x` prefix.
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl From<&NetworkDescriptor> for AddChainParams {
    fn from(network: &NetworkDescriptor) -> Self {
        Self {
            chain_id: format!("{:#x}", network.chain_id),
            chain_name: network.name.clone(),
            native_currency: network.native_currency.clone(),
            rpc_urls: vec![network.rpc_url.to_string()],
            block_explorer_urls: vec![network.block_explorer_url.to_string()],
        }
    }
}
