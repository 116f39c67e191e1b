//! Execution context bookkeeping and hook capture forwarding.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use packpilot_bridge::{RawCapture, CAPTURE_BINDING};

use crate::cdp::protocol::{BindingCalled, ExecutionContextDescription};
use crate::page::FrameContext;

/// Applies Runtime events to the context table.
pub(super) struct FrameTracker {
    contexts: Arc<DashMap<i64, FrameContext>>,
    captures: mpsc::UnboundedSender<RawCapture>,
}

impl FrameTracker {
    pub(super) fn new(
        contexts: Arc<DashMap<i64, FrameContext>>,
        captures: mpsc::UnboundedSender<RawCapture>,
    ) -> Self {
        Self { contexts, captures }
    }

    pub(super) fn handle(&self, method: &str, params: Option<&Value>) {
        match method {
            "Runtime.executionContextCreated" => {
                let Some(raw) = params.and_then(|p| p.get("context")) else {
                    return;
                };
                match serde_json::from_value::<ExecutionContextDescription>(raw.clone()) {
                    Ok(ctx) if ctx.aux_data.is_default && !ctx.aux_data.frame_id.is_empty() => {
                        debug!("Frame {} has context {}", ctx.aux_data.frame_id, ctx.id);
                        // A navigated frame gets a new context; drop its old one.
                        self.contexts
                            .retain(|_, frame| frame.frame_id != ctx.aux_data.frame_id);
                        self.contexts.insert(
                            ctx.id,
                            FrameContext {
                                frame_id: ctx.aux_data.frame_id,
                                context_id: ctx.id,
                            },
                        );
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Malformed executionContextCreated: {}", e),
                }
            }
            "Runtime.executionContextDestroyed" => {
                if let Some(id) = params
                    .and_then(|p| p.get("executionContextId"))
                    .and_then(Value::as_i64)
                {
                    self.contexts.remove(&id);
                }
            }
            "Runtime.executionContextsCleared" => {
                self.contexts.clear();
            }
            "Runtime.bindingCalled" => {
                let Some(raw) = params else { return };
                let call = match serde_json::from_value::<BindingCalled>(raw.clone()) {
                    Ok(call) => call,
                    Err(e) => {
                        warn!("Malformed bindingCalled: {}", e);
                        return;
                    }
                };
                if call.name != CAPTURE_BINDING {
                    return;
                }
                let frame_id = self
                    .contexts
                    .get(&call.execution_context_id)
                    .map(|frame| frame.frame_id.clone())
                    .unwrap_or_default();
                match RawCapture::from_binding(&frame_id, &call.payload) {
                    Some(capture) => {
                        let _ = self.captures.send(capture);
                    }
                    None => debug!("Ignoring unreadable capture from frame '{}'", frame_id),
                }
            }
            other => trace!("Ignoring event {}", other),
        }
    }
}
