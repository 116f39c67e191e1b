//! Browser wiring: connect to Chrome, attach to the game tab and build the
//! bridge and page adapter on top of the session.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use packpilot_adapter::{CdpClient, PageActionAdapter, PageSession};
use packpilot_bridge::EventBridge;
use packpilot_config::Config;
use packpilot_core::PurchaseStore;

use crate::cli::TargetArgs;

/// An attached tab with its bridge and adapter.
pub(crate) struct Attached {
    /// Owns the browser connection the session runs on.
    _client: CdpClient,
    _ingest: JoinHandle<()>,
    pub bridge: Arc<EventBridge>,
    pub adapter: PageActionAdapter<PageSession>,
}

/// Connect to the configured endpoint and attach to the matching tab.
pub(crate) async fn attach(config: &Config, target: &TargetArgs) -> Result<Attached, Box<dyn std::error::Error>> {
    let endpoint = target.endpoint.as_deref().unwrap_or(&config.browser.endpoint);
    let fragment = target
        .target
        .as_deref()
        .unwrap_or(&config.browser.target_url_contains);

    let client = CdpClient::connect(endpoint).await?;
    let page = client.find_page(fragment).await?;
    info!("Attaching to '{}' ({})", page.title, page.url);
    let session = client.attach_page(&page.id).await?;
    info!("Session {} attached to target {}", session.session_id(), session.target_id());

    let bridge = Arc::new(EventBridge::new(Arc::new(PurchaseStore::new()), &config.bridge)?);
    let captures = session
        .take_captures()
        .ok_or("capture stream already taken")?;
    let ingest = bridge.spawn_ingest(captures);

    let adapter = PageActionAdapter::new(session, bridge.clone(), config.adapter.clone());
    Ok(Attached {
        _client: client,
        _ingest: ingest,
        bridge,
        adapter,
    })
}
