//! Single-required-chain enforcement rule.

/// Forces the wallet onto one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkEnforcement {
    required_chain_id: u64,
}

impl NetworkEnforcement {
    pub fn new(required_chain_id: u64) -> Self {
        Self { required_chain_id }
    }

    pub fn required_chain_id(&self) -> u64 {
        self.required_chain_id
    }

    /// Chain to switch to, if `current` diverges from the required chain.
    ///
    /// An unknown current chain is not a mismatch.
    pub fn required_switch(&self, current: Option<u64>) -> Option<u64> {
        match current {
            Some(id) if id != self.required_chain_id => Some(self.required_chain_id),
            _ => None,
        }
    }
}
