//! Command/response correlation over the shared browser socket.
//!
//! Every command carries a fresh id and waits on a oneshot keyed by it.
//! Messages without an id are events and go to the route registered for
//! their `sessionId`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use super::error::CdpError;
use super::protocol::{CdpRequest, CdpResponse};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type Outgoing = SplitSink<Socket, Message>;
pub(crate) type Incoming = SplitStream<Socket>;

type Reply = oneshot::Sender<Result<Value, CdpError>>;

/// How long a command may wait for its response.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared by the client and all of its page sessions.
pub(crate) struct Transport {
    outgoing: tokio::sync::Mutex<Option<Outgoing>>,
    next_id: AtomicU64,
    awaiting: Mutex<HashMap<u64, Reply>>,
    routes: Mutex<HashMap<String, mpsc::UnboundedSender<CdpResponse>>>,
}

impl Transport {
    pub(crate) fn new(outgoing: Option<Outgoing>) -> Self {
        Self {
            outgoing: tokio::sync::Mutex::new(outgoing),
            next_id: AtomicU64::new(1),
            awaiting: Mutex::new(HashMap::new()),
            routes: Mutex::new(HashMap::new()),
        }
    }

    /// Register the event route of an attached session.
    pub(crate) fn route_events(&self, session_id: &str) -> mpsc::UnboundedReceiver<CdpResponse> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.routes.lock().insert(session_id.to_string(), tx);
        rx
    }

    /// Send `method` and wait for its result.
    pub(crate) async fn send(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let (id, reply) = self.register();
        let frame = serde_json::to_string(&CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(str::to_string),
        })?;
        trace!(session = ?session_id, "CDP send: {}", frame);

        let sent = match self.outgoing.lock().await.as_mut() {
            Some(sink) => sink.send(Message::Text(frame.into())).await.map_err(CdpError::from),
            None => Err(CdpError::SessionClosed),
        };
        if let Err(e) = sent {
            self.awaiting.lock().remove(&id);
            return Err(e);
        }

        self.wait(id, method, reply).await
    }

    fn register(&self) -> (u64, oneshot::Receiver<Result<Value, CdpError>>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.awaiting.lock().insert(id, tx);
        (id, rx)
    }

    async fn wait(
        &self,
        id: u64,
        method: &str,
        reply: oneshot::Receiver<Result<Value, CdpError>>,
    ) -> Result<Value, CdpError> {
        match tokio::time::timeout(COMMAND_TIMEOUT, reply).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.awaiting.lock().remove(&id);
                Err(CdpError::Timeout(format!("{} got no response", method)))
            }
        }
    }

    /// Deliver one inbound message to its waiter or session route.
    pub(crate) fn dispatch(&self, message: CdpResponse) {
        if let Some(id) = message.id {
            let Some(reply) = self.awaiting.lock().remove(&id) else {
                trace!("Response {} has no waiter", id);
                return;
            };
            let result = match message.error {
                Some(err) => Err(CdpError::Protocol {
                    code: err.code,
                    message: err.message,
                }),
                None => Ok(message.result.unwrap_or(Value::Null)),
            };
            let _ = reply.send(result);
            return;
        }

        if message.method.is_none() {
            return;
        }
        let key = message.session_id.clone().unwrap_or_default();
        let mut routes = self.routes.lock();
        let Some(route) = routes.get(&key) else {
            trace!("No route for events of session '{}'", key);
            return;
        };
        if route.send(message).is_err() {
            routes.remove(&key);
        }
    }

    /// Read the socket until it closes, then fail every pending command.
    pub(crate) async fn pump(&self, mut incoming: Incoming) {
        while let Some(frame) = incoming.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => {
                    debug!("Browser closed the socket");
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    error!("WebSocket read failed: {}", e);
                    break;
                }
            };
            trace!("CDP recv: {}", text);
            match serde_json::from_str::<CdpResponse>(&text) {
                Ok(message) => self.dispatch(message),
                Err(e) => warn!("Unparseable CDP message: {}", e),
            }
        }
        self.awaiting.lock().clear();
        self.routes.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(json: &str) -> CdpResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_dispatch_resolves_waiter() {
        let transport = Transport::new(None);
        let (id, mut reply) = transport.register();

        transport.dispatch(message(&format!(r#"{{"id":{},"result":{{"ok":1}}}}"#, id)));

        let result = reply.try_recv().unwrap().unwrap();
        assert_eq!(result["ok"], 1);
        assert!(transport.awaiting.lock().is_empty());
    }

    #[test]
    fn test_dispatch_maps_protocol_error() {
        let transport = Transport::new(None);
        let (id, mut reply) = transport.register();

        transport.dispatch(message(&format!(
            r#"{{"id":{},"error":{{"code":-32000,"message":"No target"}}}}"#,
            id
        )));

        match reply.try_recv().unwrap() {
            Err(CdpError::Protocol { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "No target");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_routes_events_by_session() {
        let transport = Transport::new(None);
        let mut events = transport.route_events("S1");

        transport.dispatch(message(r#"{"method":"Runtime.executionContextsCleared","sessionId":"S1"}"#));
        transport.dispatch(message(r#"{"method":"Runtime.executionContextsCleared","sessionId":"S2"}"#));

        let event = events.try_recv().unwrap();
        assert_eq!(event.method.as_deref(), Some("Runtime.executionContextsCleared"));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_dropped_route_is_forgotten() {
        let transport = Transport::new(None);
        drop(transport.route_events("S1"));

        transport.dispatch(message(r#"{"method":"Page.loadEventFired","sessionId":"S1"}"#));
        assert!(transport.routes.lock().is_empty());
    }

    #[tokio::test]
    async fn test_send_without_socket_is_session_closed() {
        let transport = Transport::new(None);
        let err = transport.send("Page.enable", None, None).await.unwrap_err();
        assert!(matches!(err, CdpError::SessionClosed));
        assert!(transport.awaiting.lock().is_empty());
    }
}
