//! Provider events and error definitions.

use alloy::primitives::Address;
use thiserror::Error;

/// EIP-1193 code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-1193 code for a method the origin is not authorized to call.
pub const UNAUTHORIZED_CODE: i64 = 4100;

/// Code returned by `wallet_switchEthereumChain` when the wallet does not
/// know the chain. Triggers the add-chain fallback.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// Notification pushed by the wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Permitted account list changed. Empty means the wallet locked or the
    /// user revoked access.
    AccountsChanged(Vec<Address>),
    /// Wallet moved to another chain.
    ChainChanged(u64),
    /// Provider lost its connection to every chain.
    Disconnect,
}

/// Errors reported by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The user declined the request in the wallet UI.
    #[error("request rejected by user")]
    UserRejected,

    /// The origin has not been granted access to the requested method.
    #[error("origin is not authorized for this request")]
    Unauthorized,

    /// The wallet does not know the requested chain.
    #[error("chain is not recognized by the wallet")]
    UnrecognizedChain,

    /// Any other JSON-RPC error object.
    #[error("provider error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Request never produced a JSON-RPC response.
    #[error("provider transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    /// Map a JSON-RPC error object to the provider taxonomy.
    pub fn from_code(code: i64, message: impl Into<String>) -> Self {
        match code {
            USER_REJECTED_CODE => Self::UserRejected,
            UNAUTHORIZED_CODE => Self::Unauthorized,
            UNRECOGNIZED_CHAIN_CODE => Self::UnrecognizedChain,
            _ => Self::Rpc {
                code,
                message: message.into(),
            },
        }
    }

    /// JSON-RPC error code, if the error carried one.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::UserRejected => Some(USER_REJECTED_CODE),
            Self::Unauthorized => Some(UNAUTHORIZED_CODE),
            Self::UnrecognizedChain => Some(UNRECOGNIZED_CHAIN_CODE),
            Self::Rpc { code, .. } => Some(*code),
            Self::Transport(_) => None,
        }
    }
}

/// Errors surfaced by `WalletContext::connect`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No injected wallet was detected.
    #[error("no wallet provider available")]
    MissingProvider,

    /// The wallet granted access but returned no accounts.
    #[error("wallet returned no accounts")]
    NoAccounts,

    /// `disconnect` ran while the account request was pending.
    #[error("connect cancelled by disconnect")]
    Cancelled,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Errors surfaced by a network switch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    /// Chain id is not in the network registry. Nothing was sent to the
    /// wallet.
    #[error("chain {0} is not supported")]
    ChainNotSupported(u64),

    #[error("no wallet provider available")]
    MissingProvider,

    /// `wallet_switchEthereumChain` failed with something other than 4902.
    #[error("switch request failed: {0}")]
    Provider(ProviderError),

    /// The add-chain fallback failed.
    #[error("add chain request failed: {0}")]
    AddChain(ProviderError),

    /// A later switch request was issued before this one resolved.
    #[error("switch to chain {0} was superseded by a later request")]
    Superseded(u64),
}

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;
