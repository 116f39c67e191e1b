//! Chrome DevTools Protocol transport.
//!
//! [`CdpClient`] connects to a browser that is already running with remote
//! debugging and attaches a [`PageSession`] to the game tab:
//!
//! ```rust,ignore
//! let client = CdpClient::connect("http://127.0.0.1:9222").await?;
//! let tab = client.find_page("ea.com").await?;
//! let session = client.attach_page(&tab.id).await?;
//! let captures = session.take_captures();
//! ```

mod client;
mod error;
mod protocol;
mod session;
mod transport;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::PageInfo;
pub use session::PageSession;
