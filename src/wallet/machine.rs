//! Connection state machine.
//!
//! All mutations of `ConnectionState` go through `ConnectionMachine::handle`.
//! The machine is pure: it never talks to the provider. Work that needs the
//! provider (a network switch) is returned as an `Effect` for the async shell
//! in `wallet::context` to run, and the outcome comes back as another event.
//!
//! ```text
//!                 ConnectRequested
//!  Disconnected ───────────────────▶ Connecting
//!       ▲  ▲                            │
//!       │  └──── ConnectFailed ─────────┤
//!       │                               │ ConnectSucceeded
//!       │  Disconnect /                 ▼
//!       └── AccountsChanged([]) ───  Connected ◀─┐
//!                                       │        │ ChainChanged /
//!                                       └────────┘ SwitchResolved
//! ```
//!
//! Switches carry a token. Only the resolution matching the latest token is
//! applied; earlier ones are dropped.

use alloy::primitives::Address;
use serde::Serialize;

use crate::wallet::enforcement::NetworkEnforcement;

/// Coarse connection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Read-only snapshot of the wallet connection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ConnectionState {
    phase: ConnectionPhase,
    address: Option<Address>,
    chain_id: Option<u64>,
    is_switching_network: bool,
}

impl ConnectionState {
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn address(&self) -> Option<Address> {
        self.address
    }

    /// Last chain id reported by the provider.
    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    /// Always equal to `address().is_some()`.
    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn is_switching_network(&self) -> bool {
        self.is_switching_network
    }
}

/// Inputs to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    ConnectRequested,
    ConnectSucceeded {
        accounts: Vec<Address>,
        chain_id: Option<u64>,
    },
    ConnectFailed,
    /// Local disconnect requested by the application.
    Disconnect,
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
    /// Provider emitted `disconnect`.
    ProviderDisconnected,
    SwitchResolved { token: u64, outcome: SwitchOutcome },
}

/// Result of a switch as reported back to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched(u64),
    Failed,
    Superseded,
}

/// Work the shell must perform on behalf of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    SwitchNetwork { token: u64, chain_id: u64 },
}

/// Wallet connection state machine with network enforcement.
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    policy: NetworkEnforcement,
    switch_token: u64,
}

impl ConnectionMachine {
    pub fn new(policy: NetworkEnforcement) -> Self {
        Self {
            state: ConnectionState::default(),
            policy,
            switch_token: 0,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn policy(&self) -> NetworkEnforcement {
        self.policy
    }

    /// Token of the most recently issued switch.
    pub fn current_token(&self) -> u64 {
        self.switch_token
    }

    /// Apply one event. Returns the effect to run, if any.
    pub fn handle(&mut self, event: WalletEvent) -> Option<Effect> {
        match event {
            WalletEvent::ConnectRequested => {
                if self.state.phase == ConnectionPhase::Disconnected {
                    self.state.phase = ConnectionPhase::Connecting;
                }
                None
            }
            WalletEvent::ConnectSucceeded { accounts, chain_id } => {
                // Disconnected here means the connect was cancelled while pending.
                if self.state.phase == ConnectionPhase::Disconnected {
                    return None;
                }
                let Some(address) = accounts.first().copied() else {
                    self.reset();
                    return None;
                };
                self.state.address = Some(address);
                self.state.phase = ConnectionPhase::Connected;
                if chain_id.is_some() {
                    self.state.chain_id = chain_id;
                }
                self.enforce()
            }
            WalletEvent::ConnectFailed => {
                if self.state.phase == ConnectionPhase::Connecting {
                    self.state.phase = ConnectionPhase::Disconnected;
                }
                None
            }
            WalletEvent::Disconnect | WalletEvent::ProviderDisconnected => {
                self.reset();
                None
            }
            WalletEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    self.reset();
                    None
                }
                // A local disconnect sticks until the next explicit connect.
                Some(_) if self.state.phase == ConnectionPhase::Disconnected => None,
                Some(address) => {
                    self.state.address = Some(*address);
                    self.state.phase = ConnectionPhase::Connected;
                    self.enforce()
                }
            },
            WalletEvent::ChainChanged(chain_id) => {
                self.state.chain_id = Some(chain_id);
                self.state.is_switching_network = false;
                self.enforce()
            }
            WalletEvent::SwitchResolved { token, outcome } => {
                if token != self.switch_token {
                    tracing::debug!(token, current = self.switch_token, "Dropping stale switch resolution");
                    return None;
                }
                self.state.is_switching_network = false;
                match outcome {
                    SwitchOutcome::Switched(chain_id) => {
                        self.state.chain_id = Some(chain_id);
                        self.enforce()
                    }
                    // Mismatch stays until the next provider event re-evaluates it.
                    SwitchOutcome::Failed | SwitchOutcome::Superseded => None,
                }
            }
        }
    }

    /// Start a user-requested switch. Takes a new token, so any switch still
    /// in flight resolves as stale.
    pub fn request_switch(&mut self, chain_id: u64) -> Effect {
        self.begin_switch(chain_id)
    }

    /// Whether a pending connect may still complete.
    pub fn is_connect_pending(&self) -> bool {
        self.state.phase != ConnectionPhase::Disconnected
    }

    fn enforce(&mut self) -> Option<Effect> {
        if !self.state.is_connected() || self.state.is_switching_network {
            return None;
        }
        let target = self.policy.required_switch(self.state.chain_id)?;
        tracing::info!(
            current = ?self.state.chain_id,
            required = target,
            "Chain mismatch, enforcing required network"
        );
        Some(self.begin_switch(target))
    }

    fn begin_switch(&mut self, chain_id: u64) -> Effect {
        self.switch_token += 1;
        self.state.is_switching_network = true;
        Effect::SwitchNetwork {
            token: self.switch_token,
            chain_id,
        }
    }

    fn reset(&mut self) {
        if self.state.phase == ConnectionPhase::Disconnected {
            return;
        }
        self.state = ConnectionState::default();
        // Invalidate any switch still in flight.
        self.switch_token += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const REQUIRED: u64 = 42220;
    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");

    fn machine() -> ConnectionMachine {
        ConnectionMachine::new(NetworkEnforcement::new(REQUIRED))
    }

    fn connected(chain_id: u64) -> (ConnectionMachine, Option<Effect>) {
        let mut m = machine();
        m.handle(WalletEvent::ConnectRequested);
        let effect = m.handle(WalletEvent::ConnectSucceeded {
            accounts: vec![ALICE, BOB],
            chain_id: Some(chain_id),
        });
        (m, effect)
    }

    #[test]
    fn test_connect_on_required_chain() {
        let (m, effect) = connected(REQUIRED);
        assert_eq!(effect, None);
        assert_eq!(m.state().phase(), ConnectionPhase::Connected);
        assert_eq!(m.state().address(), Some(ALICE));
        assert!(m.state().is_connected());
        assert!(!m.state().is_switching_network());
    }

    #[test]
    fn test_connect_with_no_accounts_stays_disconnected() {
        let mut m = machine();
        m.handle(WalletEvent::ConnectRequested);
        assert_eq!(m.state().phase(), ConnectionPhase::Connecting);

        let effect = m.handle(WalletEvent::ConnectSucceeded {
            accounts: vec![],
            chain_id: Some(1),
        });
        assert_eq!(effect, None);
        assert!(!m.state().is_connected());
        assert_eq!(m.state().address(), None);
        assert_eq!(m.state().phase(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn test_reconnect_with_no_accounts_clears_address() {
        let (mut m, _) = connected(REQUIRED);
        m.handle(WalletEvent::ConnectRequested);
        let effect = m.handle(WalletEvent::ConnectSucceeded {
            accounts: vec![],
            chain_id: Some(REQUIRED),
        });
        assert_eq!(effect, None);
        assert!(!m.state().is_connected());
        assert_eq!(m.state().address(), None);
        assert_eq!(m.state().phase(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn test_disconnect_cancels_pending_connect() {
        let mut m = machine();
        m.handle(WalletEvent::ConnectRequested);
        m.handle(WalletEvent::Disconnect);
        assert!(!m.is_connect_pending());

        let effect = m.handle(WalletEvent::ConnectSucceeded {
            accounts: vec![ALICE],
            chain_id: Some(1),
        });
        assert_eq!(effect, None);
        assert_eq!(m.state().phase(), ConnectionPhase::Disconnected);
        assert!(!m.state().is_connected());
    }

    #[test]
    fn test_mismatch_triggers_single_switch() {
        let (mut m, effect) = connected(1);
        assert_eq!(
            effect,
            Some(Effect::SwitchNetwork {
                token: 1,
                chain_id: REQUIRED
            })
        );
        assert!(m.state().is_switching_network());

        // Further events while switching do not stack more switches.
        assert_eq!(m.handle(WalletEvent::AccountsChanged(vec![BOB])), None);
        assert_eq!(m.state().address(), Some(BOB));
    }

    #[test]
    fn test_chain_changed_clears_switching_flag() {
        let (mut m, _) = connected(1);
        assert!(m.state().is_switching_network());

        let effect = m.handle(WalletEvent::ChainChanged(REQUIRED));
        assert_eq!(effect, None);
        assert!(!m.state().is_switching_network());
        assert_eq!(m.state().chain_id(), Some(REQUIRED));
    }

    #[test]
    fn test_failed_switch_leaves_mismatch_without_retry() {
        let (mut m, effect) = connected(1);
        let Some(Effect::SwitchNetwork { token, .. }) = effect else {
            panic!("expected switch effect");
        };

        let effect = m.handle(WalletEvent::SwitchResolved {
            token,
            outcome: SwitchOutcome::Failed,
        });
        assert_eq!(effect, None);
        assert!(!m.state().is_switching_network());
        assert_eq!(m.state().chain_id(), Some(1));

        // Next provider event re-evaluates the mismatch.
        let effect = m.handle(WalletEvent::AccountsChanged(vec![ALICE]));
        assert!(matches!(effect, Some(Effect::SwitchNetwork { chain_id: REQUIRED, .. })));
    }

    #[test]
    fn test_stale_resolution_is_dropped() {
        let (mut m, _) = connected(REQUIRED);
        let Effect::SwitchNetwork { token: t1, .. } = m.request_switch(1135);
        let Effect::SwitchNetwork { token: t2, .. } = m.request_switch(8453);
        assert!(t2 > t1);

        // Old resolution lands late and is ignored.
        m.handle(WalletEvent::SwitchResolved {
            token: t1,
            outcome: SwitchOutcome::Switched(1135),
        });
        assert!(m.state().is_switching_network());
        assert_eq!(m.state().chain_id(), Some(REQUIRED));
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut m = machine();
        let before = m.state().clone();
        assert_eq!(m.handle(WalletEvent::Disconnect), None);
        assert_eq!(m.handle(WalletEvent::Disconnect), None);
        assert_eq!(m.state(), &before);
        assert_eq!(m.current_token(), 0);
    }

    #[test]
    fn test_disconnect_invalidates_inflight_switch() {
        let (mut m, effect) = connected(1);
        let Some(Effect::SwitchNetwork { token, .. }) = effect else {
            panic!("expected switch effect");
        };
        m.handle(WalletEvent::Disconnect);
        assert!(!m.state().is_connected());

        m.handle(WalletEvent::SwitchResolved {
            token,
            outcome: SwitchOutcome::Switched(REQUIRED),
        });
        assert_eq!(m.state(), &ConnectionState::default());
    }

    #[test]
    fn test_empty_accounts_forces_disconnect() {
        let (mut m, _) = connected(REQUIRED);
        m.handle(WalletEvent::AccountsChanged(vec![]));
        assert_eq!(m.state().phase(), ConnectionPhase::Disconnected);
        assert_eq!(m.state().address(), None);
    }

    #[test]
    fn test_accounts_after_local_disconnect_are_ignored() {
        let (mut m, _) = connected(REQUIRED);
        m.handle(WalletEvent::Disconnect);
        m.handle(WalletEvent::AccountsChanged(vec![ALICE]));
        assert!(!m.state().is_connected());
    }

    #[test]
    fn test_no_enforcement_while_disconnected() {
        let mut m = machine();
        assert_eq!(m.handle(WalletEvent::ChainChanged(1)), None);
        assert_eq!(m.state().chain_id(), Some(1));
        assert!(!m.state().is_switching_network());
    }
}
