/// Live discovery from Solana `logsSubscribe`
///
/// A background task keeps a WebSocket subscription on the pump.fun and
/// Raydium AMM v4 programs. When a log batch looks like a token creation or
/// pool initialization, its signature is queued for a small pool of fetch
/// workers. They load the transaction over JSON-RPC and buffer its post
/// token balance mints (minus wSOL and USDC) until the next `discover()`
/// drains them. Signatures arriving while the queue is full are dropped.
use crate::apis::ApiManager;
use crate::discovery::DiscoverySource;
use crate::logger::{self, LogTag};
use crate::tokens::types::{USDC_MINT, WSOL_MINT};
use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

pub const PUMP_FUN_PROGRAM: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";
pub const RAYDIUM_AMM_V4_PROGRAM: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";

const TRANSACTION_FETCH_ATTEMPTS: u32 = 3;
const TRANSACTION_FETCH_DELAY: Duration = Duration::from_secs(2);
const SIGNATURE_QUEUE_CAPACITY: usize = 256;
const FETCH_WORKERS: usize = 4;

/// Log lines emitted by pump.fun `create` and Raydium `initialize2`
pub fn is_creation_log(logs: &[String]) -> bool {
    logs.iter()
        .any(|line| line.contains("Instruction: Create") || line.contains("initialize2"))
}

#[derive(Debug, Deserialize)]
struct Notification {
    method: Option<String>,
    params: Option<NotificationParams>,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    result: NotificationResult,
}

#[derive(Debug, Deserialize)]
struct NotificationResult {
    value: LogsValue,
}

#[derive(Debug, Deserialize)]
struct LogsValue {
    signature: String,
    #[serde(default)]
    err: Option<serde_json::Value>,
    #[serde(default)]
    logs: Vec<String>,
}

/// Signature of a successful creation transaction, if `text` is one
fn creation_signature(text: &str) -> Option<String> {
    let notification: Notification = serde_json::from_str(text).ok()?;
    if notification.method.as_deref() != Some("logsNotification") {
        return None;
    }
    let value = notification.params?.result.value;
    if value.err.is_some() || !is_creation_log(&value.logs) {
        return None;
    }
    Some(value.signature)
}

fn subscribe_request(id: u64, program: &str) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "logsSubscribe",
        "params": [{"mentions": [program]}, {"commitment": "confirmed"}]
    })
    .to_string()
}

/// Bounded FIFO of unique mints; the oldest entry is dropped when full
struct MintBuffer {
    mints: VecDeque<String>,
    capacity: usize,
}

impl MintBuffer {
    fn push(&mut self, mint: String) {
        if self.mints.contains(&mint) {
            return;
        }
        if self.mints.len() >= self.capacity {
            self.mints.pop_front();
        }
        self.mints.push_back(mint);
    }
}

#[derive(Clone)]
struct SharedBuffer(Arc<Mutex<MintBuffer>>);

impl SharedBuffer {
    fn new(capacity: usize) -> Self {
        Self(Arc::new(Mutex::new(MintBuffer {
            mints: VecDeque::new(),
            capacity: capacity.max(1),
        })))
    }

    fn lock(&self) -> MutexGuard<'_, MintBuffer> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn extend(&self, mints: impl IntoIterator<Item = String>) -> usize {
        let mut buffer = self.lock();
        let mut added = 0;
        for mint in mints {
            if mint == WSOL_MINT || mint == USDC_MINT {
                continue;
            }
            buffer.push(mint);
            added += 1;
        }
        added
    }

    fn drain(&self) -> Vec<String> {
        self.lock().mints.drain(..).collect()
    }
}

/// Bounded hand-off from the subscription to the fetch workers
#[derive(Clone)]
struct SignatureQueue(mpsc::Sender<String>);

impl SignatureQueue {
    /// Queue `signature`; false when it was dropped
    fn offer(&self, signature: String) -> bool {
        match self.0.try_send(signature) {
            Ok(()) => true,
            Err(TrySendError::Full(signature)) => {
                logger::debug(
                    LogTag::Discovery,
                    &format!("Signature queue full, dropping {}", signature),
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<String>>>;

pub struct RpcLogSource {
    buffer: SharedBuffer,
    tasks: Vec<JoinHandle<()>>,
}

impl RpcLogSource {
    /// Start the subscription and its fetch workers; all stop when the source is dropped
    pub fn spawn(ws_url: String, apis: Arc<ApiManager>, buffer_capacity: usize, reconnect_max_secs: u64) -> Self {
        let buffer = SharedBuffer::new(buffer_capacity);
        let (tx, rx) = mpsc::channel(SIGNATURE_QUEUE_CAPACITY);
        let rx: SharedReceiver = Arc::new(tokio::sync::Mutex::new(rx));

        let mut tasks: Vec<JoinHandle<()>> = (0..FETCH_WORKERS)
            .map(|_| tokio::spawn(fetch_worker(rx.clone(), apis.clone(), buffer.clone())))
            .collect();
        tasks.push(tokio::spawn(subscription_loop(
            ws_url,
            SignatureQueue(tx),
            Duration::from_secs(reconnect_max_secs.max(1)),
        )));
        Self { buffer, tasks }
    }
}

impl Drop for RpcLogSource {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[async_trait]
impl DiscoverySource for RpcLogSource {
    fn name(&self) -> &'static str {
        "rpc_logs"
    }

    async fn discover(&self) -> Result<Vec<String>> {
        Ok(self.buffer.drain())
    }
}

async fn fetch_worker(rx: SharedReceiver, apis: Arc<ApiManager>, buffer: SharedBuffer) {
    loop {
        let next = rx.lock().await.recv().await;
        match next {
            Some(signature) => collect_transaction_mints(&apis, &buffer, &signature).await,
            None => break,
        }
    }
}

async fn subscription_loop(ws_url: String, queue: SignatureQueue, max_backoff: Duration) {
    let mut backoff = Duration::from_secs(1);

    loop {
        match run_subscription(&ws_url, &queue).await {
            Ok(()) => {
                logger::warning(LogTag::Discovery, "Log subscription closed by server");
                backoff = Duration::from_secs(1);
            }
            Err(e) => logger::warning(
                LogTag::Discovery,
                &format!("Log subscription error: {}", e),
            ),
        }

        logger::debug(
            LogTag::Discovery,
            &format!("Reconnecting log subscription in {}s", backoff.as_secs()),
        );
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(max_backoff);
    }
}

async fn run_subscription(ws_url: &str, queue: &SignatureQueue) -> Result<()> {
    let (stream, _) = connect_async(ws_url).await?;
    let (mut write, mut read) = stream.split();

    for (id, program) in [PUMP_FUN_PROGRAM, RAYDIUM_AMM_V4_PROGRAM].iter().enumerate() {
        write
            .send(Message::Text(subscribe_request(id as u64 + 1, program)))
            .await?;
    }
    logger::info(LogTag::Discovery, &format!("Subscribed to program logs via {}", ws_url));

    while let Some(message) = read.next().await {
        match message? {
            Message::Text(text) => {
                if let Some(signature) = creation_signature(&text) {
                    queue.offer(signature);
                }
            }
            Message::Ping(payload) => write.send(Message::Pong(payload)).await?,
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}

async fn collect_transaction_mints(apis: &ApiManager, buffer: &SharedBuffer, signature: &str) {
    for attempt in 1..=TRANSACTION_FETCH_ATTEMPTS {
        match apis.helius.get_transaction_mints(signature).await {
            Ok(Some(mints)) => {
                let added = buffer.extend(mints);
                logger::debug(
                    LogTag::Discovery,
                    &format!("Transaction {} yielded {} mints", signature, added),
                );
                return;
            }
            // Not yet visible at this commitment
            Ok(None) if attempt < TRANSACTION_FETCH_ATTEMPTS => {
                tokio::time::sleep(TRANSACTION_FETCH_DELAY).await;
            }
            Ok(None) => {}
            Err(e) => {
                logger::debug(
                    LogTag::Discovery,
                    &format!("getTransaction {} failed: {}", signature, e),
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::client::test_support::{fast_fetcher, serve};
    use crate::config::Config;
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    fn notification(signature: &str, logs: &[&str], failed: bool) -> String {
        serde_json::json!({
            "jsonrpc": "2.0",
            "method": "logsNotification",
            "params": {
                "subscription": 7,
                "result": {
                    "context": {"slot": 1},
                    "value": {
                        "signature": signature,
                        "err": if failed { serde_json::json!({"InstructionError": [0, "Custom"]}) } else { serde_json::Value::Null },
                        "logs": logs,
                    }
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_creation_detection() {
        let create = notification("sig1", &["Program log: Instruction: Create"], false);
        assert_eq!(creation_signature(&create), Some("sig1".to_string()));

        let raydium = notification("sig2", &["Program log: initialize2: InitializeInstruction2"], false);
        assert_eq!(creation_signature(&raydium), Some("sig2".to_string()));

        let swap = notification("sig3", &["Program log: Instruction: Buy"], false);
        assert_eq!(creation_signature(&swap), None);

        let failed = notification("sig4", &["Program log: Instruction: Create"], true);
        assert_eq!(creation_signature(&failed), None);

        assert_eq!(creation_signature(r#"{"jsonrpc":"2.0","result":5,"id":1}"#), None);
    }

    #[test]
    fn test_buffer_excludes_quote_mints_and_caps() {
        let buffer = SharedBuffer::new(2);
        buffer.extend(vec![
            WSOL_MINT.to_string(),
            "A".to_string(),
            USDC_MINT.to_string(),
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
        ]);
        assert_eq!(buffer.drain(), vec!["B", "C"]);
        assert!(buffer.drain().is_empty());
    }

    #[tokio::test]
    async fn test_signature_queue_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let queue = SignatureQueue(tx);
        assert!(queue.offer("sig1".to_string()));
        assert!(!queue.offer("sig2".to_string()));
        assert_eq!(rx.recv().await.as_deref(), Some("sig1"));
        assert!(queue.offer("sig3".to_string()));

        drop(rx);
        assert!(!queue.offer("sig4".to_string()));
    }

    #[tokio::test]
    async fn test_drop_stops_fetch_workers() {
        let config = Config::default();
        let apis = Arc::new(ApiManager::with_fetcher(
            Arc::new(fast_fetcher(0, Duration::from_secs(1))),
            &config,
        ));

        // Nothing listens on this port; the subscription keeps reconnecting
        let source = RpcLogSource::spawn("ws://127.0.0.1:9".to_string(), apis.clone(), 10, 1);
        assert_eq!(Arc::strong_count(&apis), FETCH_WORKERS + 1);

        drop(source);
        for _ in 0..50 {
            if Arc::strong_count(&apis) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(Arc::strong_count(&apis), 1);
    }

    #[tokio::test]
    async fn test_subscription_collects_mints() {
        let rpc = Router::new().route(
            "/rpc",
            post(|| async {
                Json(serde_json::json!({
                    "jsonrpc": "2.0", "id": 1,
                    "result": {"meta": {"postTokenBalances": [
                        {"mint": WSOL_MINT},
                        {"mint": "NewMint1111111111111111111111111111111pump"}
                    ]}}
                }))
            }),
        );
        let rpc_base = serve(rpc).await;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ws_addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            // Two subscribe requests, then one creation notification
            for _ in 0..2 {
                let _ = ws.next().await;
            }
            ws.send(Message::Text(notification(
                "sig1",
                &["Program log: Instruction: Create"],
                false,
            )))
            .await
            .unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut config = Config::default();
        config.apis.rpc_url = format!("{}/rpc", rpc_base);
        config.apis.helius_api_key = None;
        let apis = Arc::new(ApiManager::with_fetcher(
            Arc::new(fast_fetcher(0, Duration::from_secs(5))),
            &config,
        ));

        let source = RpcLogSource::spawn(format!("ws://{}", ws_addr), apis, 100, 5);
        let mut found = Vec::new();
        for _ in 0..50 {
            found = source.discover().await.unwrap();
            if !found.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(found, vec!["NewMint1111111111111111111111111111111pump"]);
    }
}
