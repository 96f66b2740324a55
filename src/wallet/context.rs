//! Wallet connection context.
//!
//! Async shell around `ConnectionMachine`. It owns the provider handle, feeds
//! provider notifications into the machine in emission order, and runs the
//! switch effects the machine asks for.
//!
//! `disconnect` only clears local state. The wallet keeps whatever permission
//! it granted this origin; revoking it is up to the user in the wallet UI.

use alloy::primitives::Address;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::network::context::NetworkContext;
use crate::network::registry::NetworkDescriptor;
use crate::wallet::enforcement::NetworkEnforcement;
use crate::wallet::machine::{
    ConnectionMachine, ConnectionState, Effect, SwitchOutcome, WalletEvent,
};
use crate::wallet::provider::WalletProvider;
use crate::wallet::types::{ProviderEvent, SwitchError, WalletError};

/// Process-wide wallet connection state.
pub struct WalletContext {
    provider: Option<Arc<dyn WalletProvider>>,
    network: Arc<NetworkContext>,
    machine: Mutex<ConnectionMachine>,
    state: watch::Sender<ConnectionState>,
}

impl WalletContext {
    /// Create a context enforcing `required_chain_id`.
    ///
    /// `provider` is `None` when no injected wallet was detected; every wallet
    /// operation then fails with a missing-provider error.
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        network: Arc<NetworkContext>,
        required_chain_id: u64,
    ) -> Arc<Self> {
        if provider.is_none() {
            tracing::warn!("No wallet provider detected, wallet operations are disabled");
        }
        let machine = ConnectionMachine::new(NetworkEnforcement::new(required_chain_id));
        let (state, _) = watch::channel(machine.state().clone());
        Arc::new(Self {
            provider,
            network,
            machine: Mutex::new(machine),
            state,
        })
    }

    /// Current connection snapshot.
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Watch connection changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn network(&self) -> &Arc<NetworkContext> {
        &self.network
    }

    pub fn required_chain_id(&self) -> u64 {
        self.lock_machine().policy().required_chain_id()
    }

    /// Start pumping provider notifications into the context.
    ///
    /// Events are processed one at a time in the order the provider emitted
    /// them. Returns `None` without a provider.
    pub fn listen(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut events = self.provider.as_ref()?.subscribe();
        let ctx = Arc::clone(self);
        Some(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                ctx.on_provider_event(event);
            }
            tracing::debug!("Provider event stream closed");
        }))
    }

    /// Apply a single provider notification.
    pub fn on_provider_event(self: &Arc<Self>, event: ProviderEvent) {
        tracing::debug!(?event, "Provider event");
        let event = match event {
            ProviderEvent::AccountsChanged(accounts) => WalletEvent::AccountsChanged(accounts),
            ProviderEvent::ChainChanged(chain_id) => {
                self.network.select_for_chain(chain_id);
                WalletEvent::ChainChanged(chain_id)
            }
            ProviderEvent::Disconnect => WalletEvent::ProviderDisconnected,
        };
        self.apply(event);
    }

    /// Request account access and bind the first account.
    pub async fn connect(self: &Arc<Self>) -> Result<Address, WalletError> {
        let Some(provider) = self.provider.clone() else {
            tracing::warn!("Connect requested without a wallet provider");
            return Err(WalletError::MissingProvider);
        };

        self.apply(WalletEvent::ConnectRequested);

        let accounts = match provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::warn!(error = %e, "Account request failed");
                self.apply(WalletEvent::ConnectFailed);
                return Err(WalletError::Provider(e));
            }
        };
        let Some(address) = accounts.first().copied() else {
            tracing::warn!("Wallet returned an empty account list");
            self.apply(WalletEvent::ConnectSucceeded {
                accounts,
                chain_id: None,
            });
            return Err(WalletError::NoAccounts);
        };

        let chain_id = match provider.chain_id().await {
            Ok(chain_id) => {
                self.network.select_for_chain(chain_id);
                Some(chain_id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not read chain id after connect");
                None
            }
        };

        let completed = self.update(|machine| {
            machine
                .is_connect_pending()
                .then(|| machine.handle(WalletEvent::ConnectSucceeded { accounts, chain_id }))
        });
        let Some(effect) = completed else {
            tracing::info!(%address, "Connect cancelled by a local disconnect");
            return Err(WalletError::Cancelled);
        };
        self.spawn_effect(effect);
        tracing::info!(%address, ?chain_id, "Wallet connected");
        Ok(address)
    }

    /// Clear local connection state. Safe to call when already disconnected.
    pub fn disconnect(self: &Arc<Self>) {
        self.apply(WalletEvent::Disconnect);
    }

    /// User-initiated switch. Shares the token sequence with enforcement, so
    /// whichever request was issued last wins.
    pub async fn switch_network(
        self: &Arc<Self>,
        chain_id: u64,
    ) -> Result<Arc<NetworkDescriptor>, SwitchError> {
        if !self.network.registry().contains(chain_id) {
            return Err(SwitchError::ChainNotSupported(chain_id));
        }
        if self.provider.is_none() {
            tracing::warn!(chain_id, "Switch requested without a wallet provider");
            return Err(SwitchError::MissingProvider);
        }
        let effect = self.update(|machine| machine.request_switch(chain_id));
        self.run_effect(effect).await
    }

    /// Single update entry point. Runs `f` under the machine lock and
    /// publishes the new snapshot if it changed.
    fn update<R>(&self, f: impl FnOnce(&mut ConnectionMachine) -> R) -> R {
        let mut machine = self.lock_machine();
        let result = f(&mut machine);
        self.state.send_if_modified(|current| {
            if current != machine.state() {
                *current = machine.state().clone();
                true
            } else {
                false
            }
        });
        result
    }

    fn apply(self: &Arc<Self>, event: WalletEvent) {
        let effect = self.update(|machine| machine.handle(event));
        self.spawn_effect(effect);
    }

    fn spawn_effect(self: &Arc<Self>, effect: Option<Effect>) {
        if let Some(effect) = effect {
            let ctx = Arc::clone(self);
            tokio::spawn(async move {
                // Errors are already logged and folded into the state.
                let _ = ctx.run_effect(effect).await;
            });
        }
    }

    async fn run_effect(
        self: &Arc<Self>,
        effect: Effect,
    ) -> Result<Arc<NetworkDescriptor>, SwitchError> {
        let Effect::SwitchNetwork { token, chain_id } = effect;
        let result = self.network.switch_network(chain_id).await;
        let outcome = match &result {
            Ok(network) => SwitchOutcome::Switched(network.chain_id),
            Err(SwitchError::Superseded(_)) => SwitchOutcome::Superseded,
            Err(e) => {
                tracing::warn!(chain_id, error = %e, "Network switch did not complete");
                SwitchOutcome::Failed
            }
        };
        self.apply(WalletEvent::SwitchResolved { token, outcome });
        result
    }

    fn lock_machine(&self) -> std::sync::MutexGuard<'_, ConnectionMachine> {
        // The machine has no invariants a panicking holder could break halfway.
        self.machine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for WalletContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletContext")
            .field("state", &self.state())
            .field("network", &self.network)
            .finish()
    }
}
