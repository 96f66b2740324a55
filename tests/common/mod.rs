//! Shared utilities for integration tests.

#![allow(dead_code)]

use alloy::primitives::Address;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Notify};

use faucet_drops::cache::{SystemClock, TtlCache};
use faucet_drops::config::DropsConfig;
use faucet_drops::http::AppState;
use faucet_drops::referral::ReferralClient;
use faucet_drops::verification::{MemoryStore, VerificationService, VerificationStore};
use faucet_drops::wallet::provider::{AddChainParams, WalletProvider};
use faucet_drops::wallet::types::{ProviderError, ProviderEvent, ProviderResult};
use faucet_drops::wallet::ConnectionState;
use faucet_drops::walletconnect::{PairingClient, PairingError, PairingUri};

/// A provider request seen by [`ScriptedProvider`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    RequestAccounts,
    ChainId,
    SwitchChain(u64),
    AddChain(AddChainParams),
}

/// Wallet provider driven by a script.
///
/// Switch and add results are consumed in order and default to success. A
/// successful switch updates the chain and emits `ChainChanged`, as wallets
/// do. A switch can be held on a gate until the test releases it.
pub struct ScriptedProvider {
    accounts: Mutex<ProviderResult<Vec<Address>>>,
    chain_id: Mutex<u64>,
    switch_results: Mutex<VecDeque<ProviderResult<()>>>,
    add_results: Mutex<VecDeque<ProviderResult<()>>>,
    switch_gates: Mutex<VecDeque<Arc<Notify>>>,
    accounts_gates: Mutex<VecDeque<Arc<Notify>>>,
    calls: Mutex<Vec<Call>>,
    events: Mutex<Option<mpsc::UnboundedSender<ProviderEvent>>>,
}

impl ScriptedProvider {
    pub fn new(accounts: Vec<Address>, chain_id: u64) -> Arc<Self> {
        Arc::new(Self {
            accounts: Mutex::new(Ok(accounts)),
            chain_id: Mutex::new(chain_id),
            switch_results: Mutex::new(VecDeque::new()),
            add_results: Mutex::new(VecDeque::new()),
            switch_gates: Mutex::new(VecDeque::new()),
            accounts_gates: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            events: Mutex::new(None),
        })
    }

    pub fn reject_accounts(&self, err: ProviderError) {
        *self.accounts.lock().unwrap() = Err(err);
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock().unwrap() = Ok(accounts);
    }

    pub fn push_switch_result(&self, result: ProviderResult<()>) {
        self.switch_results.lock().unwrap().push_back(result);
    }

    pub fn push_add_result(&self, result: ProviderResult<()>) {
        self.add_results.lock().unwrap().push_back(result);
    }

    /// Hold the next switch request until the returned gate is notified.
    pub fn gate_next_switch(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.switch_gates.lock().unwrap().push_back(gate.clone());
        gate
    }

    /// Hold the next account request until the returned gate is notified.
    pub fn gate_next_accounts(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.accounts_gates.lock().unwrap().push_back(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn switch_calls(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SwitchChain(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Emit a notification to the current subscriber.
    pub fn emit(&self, event: ProviderEvent) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Wait until at least `n` calls were recorded.
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.calls.lock().unwrap().len() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("provider calls did not arrive");
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WalletProvider for ScriptedProvider {
    async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
        self.record(Call::RequestAccounts);
        let gate = self.accounts_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.accounts.lock().unwrap().clone()
    }

    async fn chain_id(&self) -> ProviderResult<u64> {
        self.record(Call::ChainId);
        Ok(*self.chain_id.lock().unwrap())
    }

    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
        self.record(Call::SwitchChain(chain_id));
        let gate = self.switch_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let result = self.switch_results.lock().unwrap().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            *self.chain_id.lock().unwrap() = chain_id;
            self.emit(ProviderEvent::ChainChanged(chain_id));
        }
        result
    }

    async fn add_chain(&self, params: AddChainParams) -> ProviderResult<()> {
        self.record(Call::AddChain(params));
        self.add_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<ProviderEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock().unwrap() = Some(tx);
        rx
    }
}

/// Wait until the connection state satisfies `pred`.
pub async fn wait_for_state(
    rx: &mut watch::Receiver<ConnectionState>,
    pred: impl FnMut(&ConnectionState) -> bool,
) -> ConnectionState {
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
        .await
        .expect("state condition not reached in time")
        .expect("wallet context dropped")
        .clone()
}

/// Pairing client with a fixed answer.
pub struct StaticPairing {
    pub succeed: bool,
    pub paired: Mutex<Vec<String>>,
}

impl StaticPairing {
    pub fn new(succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            succeed,
            paired: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PairingClient for StaticPairing {
    async fn pair(&self, uri: &PairingUri) -> Result<(), PairingError> {
        self.paired.lock().unwrap().push(uri.topic().to_string());
        if self.succeed {
            Ok(())
        } else {
            Err(PairingError::Rejected(500))
        }
    }
}

/// Handler state over a memory store and the given pairing client.
pub fn app_state(config: DropsConfig, store: MemoryStore, pairing: Arc<dyn PairingClient>) -> AppState {
    app_state_with_store(config, Arc::new(store), pairing)
}

/// Handler state over any verification store.
pub fn app_state_with_store(
    config: DropsConfig,
    store: Arc<dyn VerificationStore>,
    pairing: Arc<dyn PairingClient>,
) -> AppState {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let verification = VerificationService::new(
        store,
        Arc::new(TtlCache::new("verification")),
        config.verification.max_age_days,
        Duration::from_secs(config.verification.cache_ttl_secs),
    );
    AppState {
        registry: Arc::new(config.registry()),
        config: Arc::new(ArcSwap::from_pointee(config)),
        referral: ReferralClient::new(client),
        verification: Arc::new(verification),
        pairing,
        clock: Arc::new(SystemClock),
    }
}

/// Start a programmable mock upstream on an ephemeral port.
///
/// Each request body is sent on the returned channel; the response comes
/// from `f`.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> (SocketAddr, mpsc::UnboundedReceiver<String>)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (body_tx, body_rx) = mpsc::unbounded_channel();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let body_tx = body_tx.clone();
                    tokio::spawn(async move {
                        let body = read_request_body(&mut socket).await;
                        let _ = body_tx.send(body);

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, body_rx)
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn read_request_body(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(split) = text.find("\r\n\r\n") {
            let content_length = text[..split]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= split + 4 + content_length {
                return String::from_utf8_lossy(&buf[split + 4..split + 4 + content_length]).into_owned();
            }
        }
    }
    String::new()
}
