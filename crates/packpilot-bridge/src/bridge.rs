//! Event bridge core.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use packpilot_core::{compute_stats, CaptureSource, PurchaseResponse, PurchaseStore};

use crate::error::BridgeError;
use crate::hook;
use crate::matcher::{RequestMatcher, DEFAULT_URL_PATTERN};

/// Bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Regular expression a request URL must match.
    #[serde(default = "default_url_pattern")]
    pub url_pattern: String,

    /// Capacity of the broadcast channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_url_pattern() -> String {
    DEFAULT_URL_PATTERN.to_string()
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url_pattern: default_url_pattern(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// A network completion as reported by the page hook, before filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCapture {
    /// Frame the request was issued in. Filled in by the transport.
    #[serde(default)]
    pub frame_id: String,
    pub source: CaptureSource,
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    /// Undecoded response body.
    #[serde(default)]
    pub body: String,
}

fn default_method() -> String {
    "GET".to_string()
}

impl RawCapture {
    /// Parse the JSON string the hook passes to the capture binding.
    pub fn from_binding(frame_id: &str, payload: &str) -> Option<Self> {
        match serde_json::from_str::<RawCapture>(payload) {
            Ok(mut capture) => {
                capture.frame_id = frame_id.to_string();
                Some(capture)
            }
            Err(e) => {
                debug!("Ignoring malformed capture from frame {}: {}", frame_id, e);
                None
            }
        }
    }
}

/// Decodes captured responses, stores them and fans them out.
pub struct EventBridge {
    matcher: RequestMatcher,
    hook: String,
    store: Arc<PurchaseStore>,
    tx: broadcast::Sender<PurchaseResponse>,
    /// Frames whose hook has been installed.
    installed: DashSet<String>,
    delivered: AtomicU64,
}

impl EventBridge {
    /// Create a bridge writing into `store`.
    pub fn new(store: Arc<PurchaseStore>, config: &BridgeConfig) -> Result<Self, BridgeError> {
        if config.channel_capacity == 0 {
            return Err(BridgeError::InvalidCapacity(config.channel_capacity));
        }
        let matcher = RequestMatcher::new(&config.url_pattern)?;
        let (tx, _) = broadcast::channel(config.channel_capacity);
        let hook = hook::render(matcher.pattern());
        Ok(Self {
            matcher,
            hook,
            store,
            tx,
            installed: DashSet::new(),
            delivered: AtomicU64::new(0),
        })
    }

    pub fn store(&self) -> &Arc<PurchaseStore> {
        &self.store
    }

    /// Page script that reports responses matching this bridge's URL pattern.
    pub fn hook_script(&self) -> &str {
        &self.hook
    }

    /// Record that the hook is installed in `frame_id`.
    ///
    /// Returns false if it already was, in which case the caller must not
    /// install it again.
    pub fn mark_installed(&self, frame_id: &str) -> bool {
        self.installed.insert(frame_id.to_string())
    }

    pub fn is_installed(&self, frame_id: &str) -> bool {
        self.installed.contains(frame_id)
    }

    /// Drop the install record of a frame that navigated away or was destroyed.
    pub fn forget_frame(&self, frame_id: &str) {
        self.installed.remove(frame_id);
    }

    /// Number of payloads delivered since creation.
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Filter, decode, store and broadcast one capture.
    ///
    /// Captures that do not match or whose body is not JSON are dropped.
    /// Returns the delivered payload.
    pub fn ingest(&self, capture: RawCapture) -> Option<PurchaseResponse> {
        if !self.matcher.matches(&capture.method, &capture.url) {
            trace!("Capture {} {} does not match", capture.method, capture.url);
            return None;
        }

        let data: Value = match serde_json::from_str(&capture.body) {
            Ok(data) => data,
            Err(e) => {
                debug!("Dropping undecodable body from {}: {}", capture.url, e);
                return None;
            }
        };

        let response = PurchaseResponse::new(capture.source, capture.url, data);
        let stats = compute_stats(Some(&response.data));
        let changes = self.store.record(response.clone());

        info!(
            "purchased/items via {} (frame {}): total={} duplicates={} all_duplicates={}",
            response.source,
            capture.frame_id,
            stats.total_items,
            stats.duplicate_count,
            stats.all_duplicates
        );
        if !changes.is_empty() {
            info!("Rating histogram changed: {:?}", changes);
        }

        self.delivered.fetch_add(1, Ordering::Relaxed);
        // No subscribers is not an error; the store still has the payload.
        let _ = self.tx.send(response.clone());
        Some(response)
    }

    /// Persistent subscription to every delivered payload.
    pub fn subscribe(&self) -> broadcast::Receiver<PurchaseResponse> {
        self.tx.subscribe()
    }

    /// Arm a one-shot waiter for the next payload.
    ///
    /// Payloads delivered after this call are seen by the waiter even if it
    /// is awaited later.
    pub fn arm(&self) -> PurchaseWaiter {
        PurchaseWaiter {
            rx: self.tx.subscribe(),
        }
    }

    /// Feed captures from a transport into [`ingest`](Self::ingest) until
    /// the sender side closes.
    pub fn spawn_ingest(self: &Arc<Self>, mut rx: mpsc::UnboundedReceiver<RawCapture>) -> JoinHandle<()> {
        let bridge = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(capture) = rx.recv().await {
                bridge.ingest(capture);
            }
            debug!("Capture stream closed");
        })
    }
}

/// One-shot waiter returned by [`EventBridge::arm`].
pub struct PurchaseWaiter {
    rx: broadcast::Receiver<PurchaseResponse>,
}

impl PurchaseWaiter {
    /// Wait for the next payload, or `None` after `timeout`.
    pub async fn wait(mut self, timeout: Duration) -> Option<PurchaseResponse> {
        let next = async {
            loop {
                match self.rx.recv().await {
                    Ok(response) => return Some(response),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Waiter lagged by {} payloads", skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        };
        tokio::time::timeout(timeout, next).await.ok().flatten()
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
