//! Browser-level connection and tab discovery.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

use super::error::CdpError;
use super::protocol::{BrowserVersion, PageInfo};
use super::session::PageSession;
use super::transport::Transport;

/// Connection to a Chrome instance started with `--remote-debugging-port`.
///
/// Page sessions attached through this client share its socket.
pub struct CdpClient {
    base: Url,
    transport: Arc<Transport>,
    reader: JoinHandle<()>,
}

impl CdpClient {
    /// Discover the browser socket from `{endpoint}/json/version` and open it.
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let base = Url::parse(&format!("{}/", endpoint.trim_end_matches('/')))?;
        let unavailable = |e: reqwest::Error| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e));

        let version: BrowserVersion = reqwest::get(base.join("json/version")?)
            .await
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)?;
        info!("Browser {} at {}", version.browser, endpoint);

        let (socket, _) = tokio_tungstenite::connect_async(version.web_socket_debugger_url.as_str())
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;
        let (outgoing, incoming) = socket.split();

        let transport = Arc::new(Transport::new(Some(outgoing)));
        let reader = {
            let transport = transport.clone();
            tokio::spawn(async move { transport.pump(incoming).await })
        };

        Ok(Self {
            base,
            transport,
            reader,
        })
    }

    /// Browser-level command, or a session command when `session_id` is set.
    pub async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        self.transport.send(method, params, session_id).await
    }

    /// Tabs and workers from `/json/list`.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let pages = reqwest::get(self.base.join("json/list")?).await?.json().await?;
        Ok(pages)
    }

    /// First tab whose URL contains `url_contains`.
    pub async fn find_page(&self, url_contains: &str) -> Result<PageInfo, CdpError> {
        select_page(self.list_pages().await?, url_contains)
            .ok_or_else(|| CdpError::PageNotFound(url_contains.to_string()))
    }

    /// Attach a flattened session to `target_id` and enable its domains.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let attached = self
            .call(
                "Target.attachToTarget",
                Some(json!({ "targetId": target_id, "flatten": true })),
                None,
            )
            .await?;
        let session_id = attached["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("attachToTarget without sessionId".to_string()))?;

        let events = self.transport.route_events(session_id);
        let session = PageSession::new(
            target_id.to_string(),
            session_id.to_string(),
            self.transport.clone(),
            events,
        );
        session.enable_domains().await?;

        debug!(target_id, session_id, "Attached to page");
        Ok(session)
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn select_page(pages: Vec<PageInfo>, fragment: &str) -> Option<PageInfo> {
    pages.into_iter().find(|page| page.is_page_matching(fragment))
}
