//! WalletConnect v2 pairing URI parsing.
//!
//! Format: `wc:{topic}@2?relay-protocol={protocol}&symKey={key}[&expiryTimestamp={secs}]`

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    #[error("pairing URI must start with 'wc:'")]
    MissingScheme,

    #[error("pairing URI has no topic")]
    MissingTopic,

    #[error("unsupported pairing URI version '{0}'")]
    UnsupportedVersion(String),

    #[error("pairing URI is missing '{0}'")]
    MissingParam(&'static str),

    #[error("symKey must be 32 bytes of hex")]
    InvalidSymKey,

    #[error("expiryTimestamp must be unix seconds")]
    InvalidExpiry,
}

/// A parsed v2 pairing URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingUri {
    topic: String,
    relay_protocol: String,
    sym_key: String,
    expiry_timestamp: Option<u64>,
    raw: String,
}

impl PairingUri {
    pub fn parse(input: &str) -> Result<Self, UriError> {
        let rest = input.trim().strip_prefix("wc:").ok_or(UriError::MissingScheme)?;
        let (topic, rest) = rest.split_once('@').ok_or(UriError::MissingTopic)?;
        if topic.is_empty() {
            return Err(UriError::MissingTopic);
        }
        let (version, query) = rest.split_once('?').unwrap_or((rest, ""));
        if version != "2" {
            return Err(UriError::UnsupportedVersion(version.to_string()));
        }

        let mut relay_protocol = None;
        let mut sym_key = None;
        let mut expiry_timestamp = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "relay-protocol" => relay_protocol = Some(value.into_owned()),
                "symKey" => sym_key = Some(value.into_owned()),
                "expiryTimestamp" => {
                    expiry_timestamp = Some(value.parse::<u64>().map_err(|_| UriError::InvalidExpiry)?)
                }
                _ => {}
            }
        }

        let relay_protocol = relay_protocol
            .filter(|p| !p.is_empty())
            .ok_or(UriError::MissingParam("relay-protocol"))?;
        let sym_key = sym_key.ok_or(UriError::MissingParam("symKey"))?;
        if sym_key.len() != 64 || !sym_key.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(UriError::InvalidSymKey);
        }

        Ok(Self {
            topic: topic.to_string(),
            relay_protocol,
            sym_key,
            expiry_timestamp,
            raw: input.trim().to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn relay_protocol(&self) -> &str {
        &self.relay_protocol
    }

    pub fn sym_key(&self) -> &str {
        &self.sym_key
    }

    pub fn expiry_timestamp(&self) -> Option<u64> {
        self.expiry_timestamp
    }

    /// The URI as received.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_expired(&self, now_secs: u64) -> bool {
        matches!(self.expiry_timestamp, Some(at) if now_secs >= at)
    }
}

impl fmt::Display for PairingUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The key stays out of logs.
        write!(f, "wc:{}@2?relay-protocol={}", self.topic, self.relay_protocol)
    }
}
