//! The seam between workflows and the browser.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cdp::{CdpError, PageSession};

/// Default execution context of one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameContext {
    pub frame_id: String,
    pub context_id: i64,
}

/// Evaluates scripts in a page.
#[async_trait]
pub trait PageExecutor: Send + Sync + 'static {
    /// Evaluate in the main frame.
    async fn evaluate(&self, script: &str) -> Result<Value, CdpError>;

    /// Evaluate in one frame's execution context.
    async fn evaluate_in(&self, context_id: i64, script: &str) -> Result<Value, CdpError>;

    /// Live frames, ordered by context id.
    fn frames(&self) -> Vec<FrameContext>;

    /// Expose a binding callable from page scripts.
    async fn add_binding(&self, name: &str) -> Result<(), CdpError>;

    /// Run `source` in every new document.
    async fn add_init_script(&self, source: &str) -> Result<(), CdpError>;
}

#[async_trait]
impl PageExecutor for PageSession {
    async fn evaluate(&self, script: &str) -> Result<Value, CdpError> {
        PageSession::evaluate(self, script).await
    }

    async fn evaluate_in(&self, context_id: i64, script: &str) -> Result<Value, CdpError> {
        PageSession::evaluate_in(self, context_id, script).await
    }

    fn frames(&self) -> Vec<FrameContext> {
        PageSession::frames(self)
    }

    async fn add_binding(&self, name: &str) -> Result<(), CdpError> {
        PageSession::add_binding(self, name).await
    }

    async fn add_init_script(&self, source: &str) -> Result<(), CdpError> {
        PageSession::add_init_script(self, source).await.map(|_| ())
    }
}
