use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use packpilot_bridge::RawCapture;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::CdpResponse;
use crate::cdp::transport::Transport;
use crate::page::FrameContext;

use super::frames::FrameTracker;

/// Flattened session on the game tab.
///
/// Keeps the default execution context of every frame up to date and
/// forwards hook captures until [`take_captures`](Self::take_captures)
/// hands them to the bridge.
pub struct PageSession {
    target_id: String,
    session_id: String,
    transport: Arc<Transport>,
    contexts: Arc<DashMap<i64, FrameContext>>,
    captures: Mutex<Option<mpsc::UnboundedReceiver<RawCapture>>>,
    events: JoinHandle<()>,
}

impl PageSession {
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        transport: Arc<Transport>,
        mut events: mpsc::UnboundedReceiver<CdpResponse>,
    ) -> Self {
        let contexts = Arc::new(DashMap::new());
        let (capture_tx, capture_rx) = mpsc::unbounded_channel();
        let tracker = FrameTracker::new(contexts.clone(), capture_tx);

        let events = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Some(method) = event.method.as_deref() {
                    tracker.handle(method, event.params.as_ref());
                }
            }
            debug!("Page event stream ended");
        });

        Self {
            target_id,
            session_id,
            transport,
            contexts,
            captures: Mutex::new(Some(capture_rx)),
            events,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Hook captures. Only the first call gets the receiver.
    pub fn take_captures(&self) -> Option<mpsc::UnboundedReceiver<RawCapture>> {
        self.captures.lock().take()
    }

    /// Live frames ordered by context id.
    pub fn frames(&self) -> Vec<FrameContext> {
        let mut frames: Vec<FrameContext> =
            self.contexts.iter().map(|entry| entry.value().clone()).collect();
        frames.sort_by_key(|frame| frame.context_id);
        frames
    }

    /// Send a command scoped to this session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .send(method, params, Some(&self.session_id))
            .await
    }

    /// `Runtime.enable` replays a created event for every existing context,
    /// which seeds the frame table.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        for domain in ["Page", "Runtime"] {
            self.call(&format!("{}.enable", domain), None).await?;
        }
        debug!(session_id = %self.session_id, "Page and Runtime enabled");
        Ok(())
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        self.events.abort();
    }
}
