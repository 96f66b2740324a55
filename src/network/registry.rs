//! Static registry of supported chains.
//!
//! The registry is built once at startup (either from the built-in table or
//! from the `[[networks]]` section of the config file) and never mutated
//! afterwards. Descriptors are handed out as `Arc`s so the active network can
//! point into the registry without owning it.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Native gas token of a chain, as required by `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for NativeCurrency {
    fn default() -> Self {
        Self {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

/// Everything the application knows about one supported chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    /// Human-readable network name.
    pub name: String,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Public JSON-RPC endpoint handed to wallets.
    pub rpc_url: Url,
    /// Block explorer root.
    pub block_explorer_url: Url,
    /// Display color used by the dashboard (CSS hex).
    pub display_color: String,
    /// Faucet factory contract deployed on this chain.
    pub factory_address: Address,
    #[serde(default)]
    pub native_currency: NativeCurrency,
}

/// Row of the built-in table. Kept as plain strings so the table can be a
/// `const`.
struct BuiltinNetwork {
    name: &'static str,
    chain_id: u64,
    rpc_url: &'static str,
    block_explorer_url: &'static str,
    display_color: &'static str,
    factory_address: Address,
    currency: (&'static str, &'static str),
}

const BUILTIN_NETWORKS: &[BuiltinNetwork] = &[
    BuiltinNetwork {
        name: "Celo",
        chain_id: 42220,
        rpc_url: "https://forno.celo.org",
        block_explorer_url: "https://celoscan.io",
        display_color: "#35D07F",
        factory_address: address!("0x17cfed7fece35a9a71d60fbb5ca52237103a21fb"),
        currency: ("Celo", "CELO"),
    },
    BuiltinNetwork {
        name: "Lisk",
        chain_id: 1135,
        rpc_url: "https://rpc.api.lisk.com",
        block_explorer_url: "https://blockscout.lisk.com",
        display_color: "#0D4477",
        factory_address: address!("0x96e9911df17e94f7048ccbf7eccc8d9b5edecb5c"),
        currency: ("Ether", "ETH"),
    },
    BuiltinNetwork {
        name: "Arbitrum One",
        chain_id: 42161,
        rpc_url: "https://arb1.arbitrum.io/rpc",
        block_explorer_url: "https://arbiscan.io",
        display_color: "#28A0F0",
        factory_address: address!("0x9d6f441b31fba22700bb3217229eb89b13fb49de"),
        currency: ("Ether", "ETH"),
    },
    BuiltinNetwork {
        name: "Base",
        chain_id: 8453,
        rpc_url: "https://mainnet.base.org",
        block_explorer_url: "https://basescan.org",
        display_color: "#0052FF",
        factory_address: address!("0x945431302922b69d500671201cee62900624c6d5"),
        currency: ("Ether", "ETH"),
    },
];

/// Ordered, immutable set of supported networks.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: Vec<Arc<NetworkDescriptor>>,
}

impl NetworkRegistry {
    /// Registry with the networks the dApp ships with.
    pub fn builtin() -> Self {
        let networks = BUILTIN_NETWORKS
            .iter()
            .map(|n| NetworkDescriptor {
                name: n.name.to_string(),
                chain_id: n.chain_id,
                // Static table, covered by `test_builtin_registry`.
                rpc_url: Url::parse(n.rpc_url).expect("builtin RPC URL"),
                block_explorer_url: Url::parse(n.block_explorer_url).expect("builtin explorer URL"),
                display_color: n.display_color.to_string(),
                factory_address: n.factory_address,
                native_currency: NativeCurrency {
                    name: n.currency.0.to_string(),
                    symbol: n.currency.1.to_string(),
                    decimals: 18,
                },
            })
            .collect();
        Self::from_descriptors(networks)
    }

    /// Registry from an explicit list. Order is preserved.
    pub fn from_descriptors(networks: Vec<NetworkDescriptor>) -> Self {
        Self {
            networks: networks.into_iter().map(Arc::new).collect(),
        }
    }

    /// All supported networks in registry order.
    pub fn list_supported_networks(&self) -> &[Arc<NetworkDescriptor>] {
        &self.networks
    }

    /// Look up a network by chain id.
    pub fn find(&self, chain_id: u64) -> Option<Arc<NetworkDescriptor>> {
        self.networks
            .iter()
            .find(|n| n.chain_id == chain_id)
            .cloned()
    }

    pub fn contains(&self, chain_id: u64) -> bool {
        self.networks.iter().any(|n| n.chain_id == chain_id)
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
