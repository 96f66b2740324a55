//! WalletConnect pairing redirect.
//!
//! # Data Flow
//! ```text
//! GET /wc?uri=wc:...                     → parse → pair → delayed redirect home
//!                                                       → on failure: home?error=pairing_failed
//! GET /wc?requestId=..&sessionTopic=..   → redirect home with both forwarded
//! GET /wc                                → redirect home
//! ```
//!
//! No retry and no timeout beyond the post-success delay.

pub mod pairing;
pub mod uri;

use serde::Deserialize;
use std::time::Duration;

use crate::cache::Clock;
use crate::observability::metrics;

pub use pairing::{HttpPairingClient, PairingClient, PairingError};
pub use uri::{PairingUri, UriError};

/// Navigation parameters accepted by the handler.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingQuery {
    pub uri: Option<String>,
    pub request_id: Option<String>,
    pub session_topic: Option<String>,
}

/// What the query asks for. A URI wins over a session pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingAction {
    Pair(String),
    ForwardSession { request_id: String, session_topic: String },
    Home,
}

impl PairingQuery {
    pub fn action(self) -> PairingAction {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        if let Some(uri) = present(self.uri) {
            return PairingAction::Pair(uri);
        }
        match (present(self.request_id), present(self.session_topic)) {
            (Some(request_id), Some(session_topic)) => PairingAction::ForwardSession {
                request_id,
                session_topic,
            },
            _ => PairingAction::Home,
        }
    }
}

/// Where to send the client next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Immediate(String),
    Delayed { location: String, delay: Duration },
}

impl Redirect {
    pub fn location(&self) -> &str {
        match self {
            Redirect::Immediate(location) => location,
            Redirect::Delayed { location, .. } => location,
        }
    }
}

fn with_query(home: &str, pairs: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(pairs);
    format!("{}?{}", home, serializer.finish())
}

/// Run the pairing flow for one request. `clock` decides URI expiry.
pub async fn resolve(
    action: PairingAction,
    client: &dyn PairingClient,
    clock: &dyn Clock,
    home: &str,
    delay: Duration,
) -> Redirect {
    match action {
        PairingAction::Home => Redirect::Immediate(home.to_string()),
        PairingAction::ForwardSession {
            request_id,
            session_topic,
        } => {
            tracing::debug!(request_id = %request_id, "Forwarding session request");
            Redirect::Immediate(with_query(
                home,
                &[("requestId", request_id.as_str()), ("sessionTopic", session_topic.as_str())],
            ))
        }
        PairingAction::Pair(raw) => match pair(&raw, client, clock).await {
            Ok(()) => {
                metrics::record_pairing("paired");
                Redirect::Delayed {
                    location: home.to_string(),
                    delay,
                }
            }
            Err(reason) => {
                tracing::warn!(reason = %reason, "WalletConnect pairing failed");
                metrics::record_pairing("failed");
                Redirect::Immediate(with_query(home, &[("error", "pairing_failed")]))
            }
        },
    }
}

#[derive(Debug, thiserror::Error)]
enum PairFailure {
    #[error(transparent)]
    Uri(#[from] UriError),
    #[error(transparent)]
    Pairing(#[from] PairingError),
}

async fn pair(raw: &str, client: &dyn PairingClient, clock: &dyn Clock) -> Result<(), PairFailure> {
    let uri = PairingUri::parse(raw)?;
    if uri.is_expired(clock.now_secs()) {
        return Err(PairingError::Expired.into());
    }
    client.pair(&uri).await?;
    Ok(())
}
