//! WebSocket transport adapter
//!
//! Owns one connection to the game server. Socket I/O runs as a task on a
//! tokio runtime and reports back over a channel; the render loop drains
//! that channel, so connection state only ever changes on the thread that
//! also mutates the world.

use futures_util::{SinkExt, StreamExt};
use log::{debug, info, trace, warn};
use shared::Rgb;
use std::fmt;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("server host is empty")]
    EmptyHost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Errored,
}

/// Raw notifications from the socket task, in transport order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Open,
    Error(String),
    Close,
    Frame(String),
}

/// Game server URL for one room: `{ws|wss}://{host}/ws?rk={room}[&color=RRGGBB]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    pub fn new(
        host: &str,
        secure: bool,
        room: &str,
        color: Option<Rgb>,
    ) -> Result<Self, TransportError> {
        if host.trim().is_empty() {
            return Err(TransportError::EmptyHost);
        }

        let scheme = if secure { "wss" } else { "ws" };
        let mut url = Url::parse(&format!("{}://{}/ws", scheme, host))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("rk", room);
            if let Some(color) = color {
                query.append_pair("color", &color.to_hex());
            }
        }

        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Task-side ends of a connection's channels.
pub(crate) struct TransportLink {
    pub(crate) events: mpsc::UnboundedSender<TransportEvent>,
    pub(crate) outbound: mpsc::UnboundedReceiver<String>,
}

pub struct Connection {
    state: ConnectionState,
    outbound: Option<mpsc::UnboundedSender<String>>,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
    task: Option<JoinHandle<()>>,
    torn_down: bool,
}

impl Connection {
    /// Starts connecting to `endpoint` on `runtime`. The connection begins in
    /// [`ConnectionState::Connecting`]; progress shows up through
    /// [`Connection::poll_event`].
    pub fn connect(endpoint: &Endpoint, runtime: &Handle) -> Self {
        let (mut connection, link) = Self::detached();
        info!("Connecting to {}", endpoint);
        connection.task = Some(runtime.spawn(run_socket(endpoint.as_str().to_string(), link)));
        connection
    }

    /// A connection with no socket behind it; the link end is driven by hand.
    pub(crate) fn detached() -> (Self, TransportLink) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let connection = Self {
            state: ConnectionState::Connecting,
            outbound: Some(outbound_tx),
            inbound: events_rx,
            task: None,
            torn_down: false,
        };
        let link = TransportLink {
            events: events_tx,
            outbound: outbound_rx,
        };
        (connection, link)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Best-effort write. Anything sent while the connection is not open is
    /// dropped on the spot.
    pub fn send(&mut self, payload: String) -> bool {
        if self.state != ConnectionState::Open {
            trace!("Dropping outbound frame, connection is {:?}", self.state);
            return false;
        }

        match &self.outbound {
            Some(outbound) => outbound.send(payload).is_ok(),
            None => false,
        }
    }

    /// Takes the next pending transport event and advances the state.
    pub fn poll_event(&mut self) -> Option<TransportEvent> {
        if self.torn_down {
            return None;
        }

        let event = self.inbound.try_recv().ok()?;
        match &event {
            TransportEvent::Open => self.state = ConnectionState::Open,
            TransportEvent::Error(_) => self.state = ConnectionState::Errored,
            TransportEvent::Close => {
                if self.state != ConnectionState::Errored {
                    self.state = ConnectionState::Closed;
                }
            }
            TransportEvent::Frame(_) => {}
        }
        Some(event)
    }

    /// Stops all traffic. Pending and future inbound events are discarded.
    pub fn close(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        // dropping the sender lets the socket task send a close frame and exit
        self.outbound = None;
        self.inbound.close();
        if self.state != ConnectionState::Errored {
            self.state = ConnectionState::Closed;
        }
        debug!("Connection torn down");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() && !self.torn_down {
                task.abort();
            }
        }
    }
}

async fn run_socket(url: String, mut link: TransportLink) {
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            warn!("Failed to connect to {}: {}", url, e);
            let _ = link.events.send(TransportEvent::Error(e.to_string()));
            let _ = link.events.send(TransportEvent::Close);
            return;
        }
    };

    info!("Connection is open");
    if link.events.send(TransportEvent::Open).is_err() {
        return;
    }

    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            outgoing = link.outbound.recv() => {
                match outgoing {
                    Some(text) => {
                        if let Err(e) = sink.send(Message::Text(text.into())).await {
                            warn!("Error sending frame: {}", e);
                            let _ = link.events.send(TransportEvent::Error(e.to_string()));
                            break;
                        }
                    }
                    None => {
                        debug!("Client hung up, closing socket");
                        let _ = sink.close().await;
                        return;
                    }
                }
            },

            incoming = source.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if link.events.send(TransportEvent::Frame(text.as_str().to_owned())).is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!("Server closed the connection: {:?}", frame);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Error receiving frame: {}", e);
                        let _ = link.events.send(TransportEvent::Error(e.to_string()));
                        break;
                    }
                    None => break,
                }
            },
        }
    }

    let _ = link.events.send(TransportEvent::Close);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_with_color() {
        let endpoint =
            Endpoint::new("127.0.0.1:8080", false, "abc123", Some(Rgb::new(255, 0, 16))).unwrap();
        assert_eq!(
            endpoint.as_str(),
            "ws://127.0.0.1:8080/ws?rk=abc123&color=FF0010"
        );
    }

    #[test]
    fn test_endpoint_secure_without_color() {
        let endpoint = Endpoint::new("snake.example.com", true, "room", None).unwrap();
        assert_eq!(endpoint.as_str(), "wss://snake.example.com/ws?rk=room");
    }

    #[test]
    fn test_endpoint_encodes_room_key() {
        let endpoint = Endpoint::new("localhost:9000", false, "a b&c", None).unwrap();
        assert_eq!(endpoint.as_str(), "ws://localhost:9000/ws?rk=a+b%26c");
    }

    #[test]
    fn test_endpoint_rejects_empty_host() {
        assert!(matches!(
            Endpoint::new("  ", false, "room", None),
            Err(TransportError::EmptyHost)
        ));
    }

    #[test]
    fn test_send_dropped_while_connecting() {
        let (mut connection, mut link) = Connection::detached();
        assert_eq!(connection.state(), ConnectionState::Connecting);

        assert!(!connection.send("{\"t\":0.0}".to_string()));
        assert!(link.outbound.try_recv().is_err());
    }

    #[test]
    fn test_state_follows_events() {
        let (mut connection, link) = Connection::detached();

        link.events.send(TransportEvent::Open).unwrap();
        assert_eq!(connection.poll_event(), Some(TransportEvent::Open));
        assert_eq!(connection.state(), ConnectionState::Open);

        link.events
            .send(TransportEvent::Frame("{}".to_string()))
            .unwrap();
        assert_eq!(
            connection.poll_event(),
            Some(TransportEvent::Frame("{}".to_string()))
        );
        assert_eq!(connection.state(), ConnectionState::Open);

        link.events
            .send(TransportEvent::Error("reset".to_string()))
            .unwrap();
        link.events.send(TransportEvent::Close).unwrap();
        connection.poll_event();
        connection.poll_event();
        assert_eq!(connection.state(), ConnectionState::Errored);
        assert_eq!(connection.poll_event(), None);
    }

    #[test]
    fn test_send_delivered_only_while_open() {
        let (mut connection, mut link) = Connection::detached();
        link.events.send(TransportEvent::Open).unwrap();
        connection.poll_event();

        assert!(connection.send("first".to_string()));
        assert_eq!(link.outbound.try_recv().unwrap(), "first");

        link.events.send(TransportEvent::Close).unwrap();
        connection.poll_event();
        assert_eq!(connection.state(), ConnectionState::Closed);

        assert!(!connection.send("second".to_string()));
        assert!(link.outbound.try_recv().is_err());
    }

    #[test]
    fn test_refused_connect_reports_error_then_close() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let (mut connection, link) = Connection::detached();

        tokio_test::block_on(run_socket(format!("ws://127.0.0.1:{}/ws?rk=r", port), link));

        assert!(matches!(
            connection.poll_event(),
            Some(TransportEvent::Error(_))
        ));
        assert_eq!(connection.poll_event(), Some(TransportEvent::Close));
        assert_eq!(connection.state(), ConnectionState::Errored);
        assert_eq!(connection.poll_event(), None);
    }

    #[test]
    fn test_close_discards_pending_events() {
        let (mut connection, mut link) = Connection::detached();
        link.events.send(TransportEvent::Open).unwrap();
        link.events
            .send(TransportEvent::Frame("late".to_string()))
            .unwrap();

        connection.close();
        assert!(connection.torn_down);
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert_eq!(connection.poll_event(), None);
        assert!(!connection.send("after".to_string()));
        assert!(link.outbound.try_recv().is_err());
    }
}
