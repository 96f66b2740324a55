//! Active network selection and wallet-side chain switching.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::network::registry::{NetworkDescriptor, NetworkRegistry};
use crate::observability::metrics;
use crate::wallet::provider::{AddChainParams, WalletProvider};
use crate::wallet::types::{ProviderError, SwitchError};

/// Process-wide holder of the active network.
///
/// The active network is either unselected (`None`) or a member of the
/// registry. Each `switch_network` call takes a ticket; a call that resolves
/// after a later call was issued is reported as `SwitchError::Superseded` and
/// leaves the selection alone.
pub struct NetworkContext {
    registry: Arc<NetworkRegistry>,
    provider: Option<Arc<dyn WalletProvider>>,
    active: watch::Sender<Option<Arc<NetworkDescriptor>>>,
    generation: AtomicU64,
}

impl NetworkContext {
    pub fn new(registry: Arc<NetworkRegistry>, provider: Option<Arc<dyn WalletProvider>>) -> Self {
        let (active, _) = watch::channel(None);
        Self {
            registry,
            provider,
            active,
            generation: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<NetworkRegistry> {
        &self.registry
    }

    /// Currently selected network, if any.
    pub fn active(&self) -> Option<Arc<NetworkDescriptor>> {
        self.active.borrow().clone()
    }

    /// Watch the active network.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<NetworkDescriptor>>> {
        self.active.subscribe()
    }

    /// Ask the wallet to move to `chain_id`.
    ///
    /// Waits on the wallet for as long as the user takes to answer the prompt.
    pub async fn switch_network(&self, chain_id: u64) -> Result<Arc<NetworkDescriptor>, SwitchError> {
        let target = self
            .registry
            .find(chain_id)
            .ok_or(SwitchError::ChainNotSupported(chain_id))?;
        let provider = self.provider.as_ref().ok_or(SwitchError::MissingProvider)?;
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::info!(chain_id, network = %target.name, "Requesting network switch");

        match provider.switch_chain(chain_id).await {
            Ok(()) => {}
            Err(ProviderError::UnrecognizedChain) => {
                tracing::info!(chain_id, "Wallet does not know chain, requesting add");
                if let Err(e) = provider.add_chain(AddChainParams::from(target.as_ref())).await {
                    tracing::warn!(chain_id, error = %e, "Add chain request failed");
                    metrics::record_network_switch("add_chain_failed");
                    return Err(SwitchError::AddChain(e));
                }
            }
            Err(e) => {
                tracing::warn!(chain_id, error = %e, "Network switch failed");
                metrics::record_network_switch(if e == ProviderError::UserRejected {
                    "rejected"
                } else {
                    "failed"
                });
                return Err(SwitchError::Provider(e));
            }
        }

        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!(chain_id, ticket, "Switch superseded by a later request");
            metrics::record_network_switch("superseded");
            return Err(SwitchError::Superseded(chain_id));
        }

        self.active.send_replace(Some(Arc::clone(&target)));
        metrics::record_network_switch("switched");
        tracing::info!(chain_id, network = %target.name, "Network switched");
        Ok(target)
    }

    /// Follow a chain reported by the provider.
    ///
    /// Unknown chains leave the selection unchanged.
    pub fn select_for_chain(&self, chain_id: u64) -> Option<Arc<NetworkDescriptor>> {
        let network = self.registry.find(chain_id)?;
        self.active.send_replace(Some(Arc::clone(&network)));
        Some(network)
    }
}

impl std::fmt::Debug for NetworkContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkContext")
            .field("networks", &self.registry.len())
            .field("active", &self.active().map(|n| n.chain_id))
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::types::{ProviderEvent, ProviderResult};
    use alloy::primitives::Address;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Wallet that knows a fixed set of chains.
    struct FixedWallet {
        known: Mutex<Vec<u64>>,
        reject: bool,
        added: Mutex<Vec<AddChainParams>>,
    }

    impl FixedWallet {
        fn new(known: Vec<u64>) -> Self {
            Self {
                known: Mutex::new(known),
                reject: false,
                added: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl WalletProvider for FixedWallet {
        async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
            Ok(vec![Address::ZERO])
        }

        async fn chain_id(&self) -> ProviderResult<u64> {
            Ok(42220)
        }

        async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
            if self.reject {
                return Err(ProviderError::UserRejected);
            }
            if self.known.lock().unwrap().contains(&chain_id) {
                Ok(())
            } else {
                Err(ProviderError::UnrecognizedChain)
            }
        }

        async fn add_chain(&self, params: AddChainParams) -> ProviderResult<()> {
            self.added.lock().unwrap().push(params);
            Ok(())
        }

        fn subscribe(&self) -> mpsc::UnboundedReceiver<ProviderEvent> {
            mpsc::unbounded_channel().1
        }
    }

    fn context(wallet: FixedWallet) -> (NetworkContext, Arc<FixedWallet>) {
        let wallet = Arc::new(wallet);
        let ctx = NetworkContext::new(
            Arc::new(NetworkRegistry::builtin()),
            Some(wallet.clone() as Arc<dyn WalletProvider>),
        );
        (ctx, wallet)
    }

    #[tokio::test]
    async fn test_switch_to_known_chain() {
        let (ctx, wallet) = context(FixedWallet::new(vec![42220, 8453]));
        assert!(ctx.active().is_none());

        let network = ctx.switch_network(8453).await.unwrap();
        assert_eq!(network.name, "Base");
        assert_eq!(ctx.active().unwrap().chain_id, 8453);
        assert!(wallet.added.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_chain_is_rejected_without_state_change() {
        let (ctx, _) = context(FixedWallet::new(vec![42220]));
        ctx.switch_network(42220).await.unwrap();

        let err = ctx.switch_network(999).await.unwrap_err();
        assert_eq!(err, SwitchError::ChainNotSupported(999));
        assert_eq!(ctx.active().unwrap().chain_id, 42220);
    }

    #[tokio::test]
    async fn test_add_chain_fallback() {
        let (ctx, wallet) = context(FixedWallet::new(vec![]));
        let network = ctx.switch_network(1135).await.unwrap();
        assert_eq!(network.chain_id, 1135);

        let added = wallet.added.lock().unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].chain_id, "0x46f");
        assert_eq!(added[0].chain_name, "Lisk");
    }

    #[tokio::test]
    async fn test_rejection_keeps_previous_selection() {
        let mut wallet = FixedWallet::new(vec![42220]);
        wallet.reject = true;
        let (ctx, _) = context(wallet);
        ctx.select_for_chain(42220);

        let err = ctx.switch_network(8453).await.unwrap_err();
        assert_eq!(err, SwitchError::Provider(ProviderError::UserRejected));
        assert_eq!(ctx.active().unwrap().chain_id, 42220);
    }

    #[tokio::test]
    async fn test_missing_provider() {
        let ctx = NetworkContext::new(Arc::new(NetworkRegistry::builtin()), None);
        assert_eq!(ctx.switch_network(42220).await.unwrap_err(), SwitchError::MissingProvider);
    }

    #[test]
    fn test_select_for_unknown_chain_is_ignored() {
        let ctx = NetworkContext::new(Arc::new(NetworkRegistry::builtin()), None);
        assert!(ctx.select_for_chain(1).is_none());
        assert!(ctx.active().is_none());
        assert!(ctx.select_for_chain(42161).is_some());
        assert_eq!(ctx.active().unwrap().chain_id, 42161);
    }
}
