//! Typed event dispatch on top of the transport
//!
//! Every inbound frame becomes exactly one [`DomainEvent`], handed to the
//! handlers registered for that kind in registration order. Handlers receive
//! the caller's context mutably, so subscribers mutate explicit state instead
//! of captured shared maps.

use crate::network::{Connection, ConnectionState, Endpoint, TransportEvent};
use log::{debug, error, trace, warn};
use shared::{
    decode_frame, DomainEvent, PebbleEventPayload, PebblePositionEventPayload, PlayerEventPayload,
    PlayerPositionEventPayload, RotationRequest,
};
use tokio::runtime::Handle;

type Handler<C, P> = Box<dyn FnMut(&mut C, &P)>;
type SignalHandler<C> = Box<dyn FnMut(&mut C)>;

struct Subscribers<C> {
    connection_open: Vec<SignalHandler<C>>,
    connection_error: Vec<SignalHandler<C>>,
    connection_close: Vec<SignalHandler<C>>,
    you_are: Vec<Handler<C, PlayerEventPayload>>,
    player_add: Vec<Handler<C, PlayerEventPayload>>,
    position_update: Vec<Handler<C, PlayerPositionEventPayload>>,
    player_part_add: Vec<Handler<C, PlayerEventPayload>>,
    player_remove: Vec<Handler<C, PlayerEventPayload>>,
    game_over: Vec<SignalHandler<C>>,
    pebble_add: Vec<Handler<C, PebblePositionEventPayload>>,
    pebble_remove: Vec<Handler<C, PebbleEventPayload>>,
}

impl<C> Default for Subscribers<C> {
    fn default() -> Self {
        Self {
            connection_open: Vec::new(),
            connection_error: Vec::new(),
            connection_close: Vec::new(),
            you_are: Vec::new(),
            player_add: Vec::new(),
            position_update: Vec::new(),
            player_part_add: Vec::new(),
            player_remove: Vec::new(),
            game_over: Vec::new(),
            pebble_add: Vec::new(),
            pebble_remove: Vec::new(),
        }
    }
}

fn notify<C>(handlers: &mut [SignalHandler<C>], ctx: &mut C) -> usize {
    for handler in handlers.iter_mut() {
        handler(ctx);
    }
    handlers.len()
}

fn deliver<C, P>(handlers: &mut [Handler<C, P>], ctx: &mut C, payload: &P) -> usize {
    for handler in handlers.iter_mut() {
        handler(ctx, payload);
    }
    handlers.len()
}

pub struct EventDispatcher<C> {
    endpoint: Endpoint,
    connection: Option<Connection>,
    subscribers: Subscribers<C>,
    shut_down: bool,
}

impl<C> EventDispatcher<C> {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            connection: None,
            subscribers: Subscribers::default(),
            shut_down: false,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Opens the connection. Only the first call has any effect.
    pub fn connect(&mut self, runtime: &Handle) -> bool {
        if self.connection.is_some() || self.shut_down {
            debug!("connect() ignored, dispatcher already connected");
            return false;
        }
        let connection = Connection::connect(&self.endpoint, runtime);
        self.attach(connection)
    }

    /// Uses an already created connection. Same once-only rule as `connect`.
    pub(crate) fn attach(&mut self, connection: Connection) -> bool {
        if self.connection.is_some() || self.shut_down {
            return false;
        }
        self.connection = Some(connection);
        true
    }

    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.connection.as_ref().map(Connection::state)
    }

    pub fn on_connection_open(&mut self, handler: impl FnMut(&mut C) + 'static) {
        self.subscribers.connection_open.push(Box::new(handler));
    }

    pub fn on_connection_error(&mut self, handler: impl FnMut(&mut C) + 'static) {
        self.subscribers.connection_error.push(Box::new(handler));
    }

    pub fn on_connection_close(&mut self, handler: impl FnMut(&mut C) + 'static) {
        self.subscribers.connection_close.push(Box::new(handler));
    }

    pub fn on_you_are(&mut self, handler: impl FnMut(&mut C, &PlayerEventPayload) + 'static) {
        self.subscribers.you_are.push(Box::new(handler));
    }

    pub fn on_player_add(&mut self, handler: impl FnMut(&mut C, &PlayerEventPayload) + 'static) {
        self.subscribers.player_add.push(Box::new(handler));
    }

    pub fn on_position_update(
        &mut self,
        handler: impl FnMut(&mut C, &PlayerPositionEventPayload) + 'static,
    ) {
        self.subscribers.position_update.push(Box::new(handler));
    }

    pub fn on_player_part_add(
        &mut self,
        handler: impl FnMut(&mut C, &PlayerEventPayload) + 'static,
    ) {
        self.subscribers.player_part_add.push(Box::new(handler));
    }

    pub fn on_player_remove(&mut self, handler: impl FnMut(&mut C, &PlayerEventPayload) + 'static) {
        self.subscribers.player_remove.push(Box::new(handler));
    }

    pub fn on_game_over(&mut self, handler: impl FnMut(&mut C) + 'static) {
        self.subscribers.game_over.push(Box::new(handler));
    }

    pub fn on_pebble_add(
        &mut self,
        handler: impl FnMut(&mut C, &PebblePositionEventPayload) + 'static,
    ) {
        self.subscribers.pebble_add.push(Box::new(handler));
    }

    pub fn on_pebble_remove(&mut self, handler: impl FnMut(&mut C, &PebbleEventPayload) + 'static) {
        self.subscribers.pebble_remove.push(Box::new(handler));
    }

    /// Reports the local heading to the server. Dropped unless the
    /// connection is open.
    pub fn send_rotation(&mut self, t: f32) -> bool {
        if self.shut_down {
            return false;
        }
        let Some(connection) = self.connection.as_mut() else {
            return false;
        };

        match (RotationRequest { t }).to_json() {
            Ok(payload) => connection.send(payload),
            Err(e) => {
                error!("Failed to serialize rotation: {}", e);
                false
            }
        }
    }

    /// Drains every pending transport event and dispatches the ones that
    /// decode. Returns how many events reached handlers.
    pub fn pump(&mut self, ctx: &mut C) -> usize {
        let mut dispatched = 0;

        while !self.shut_down {
            let Some(event) = self.connection.as_mut().and_then(Connection::poll_event) else {
                break;
            };

            let event = match event {
                TransportEvent::Open => DomainEvent::ConnectionOpen,
                TransportEvent::Error(reason) => {
                    warn!("Connection error: {}", reason);
                    DomainEvent::ConnectionError
                }
                TransportEvent::Close => DomainEvent::ConnectionClose,
                TransportEvent::Frame(text) => match decode_frame(&text) {
                    Ok(Some(event)) => event,
                    Ok(None) => {
                        debug!("Ignoring frame of unknown kind: {}", text);
                        continue;
                    }
                    Err(e) => {
                        warn!("Dropping frame: {}", e);
                        continue;
                    }
                },
            };

            trace!("Dispatching {:?}", event.kind());
            self.dispatch(ctx, &event);
            dispatched += 1;
        }

        dispatched
    }

    /// Runs every handler subscribed to the event's kind. Returns how many ran.
    pub fn dispatch(&mut self, ctx: &mut C, event: &DomainEvent) -> usize {
        let subscribers = &mut self.subscribers;
        let handled = match event {
            DomainEvent::ConnectionOpen => notify(&mut subscribers.connection_open, ctx),
            DomainEvent::ConnectionError => notify(&mut subscribers.connection_error, ctx),
            DomainEvent::ConnectionClose => notify(&mut subscribers.connection_close, ctx),
            DomainEvent::YouAre(payload) => deliver(&mut subscribers.you_are, ctx, payload),
            DomainEvent::PlayerAdd(payload) => deliver(&mut subscribers.player_add, ctx, payload),
            DomainEvent::PositionUpdate(payload) => {
                deliver(&mut subscribers.position_update, ctx, payload)
            }
            DomainEvent::PlayerPartAdd(payload) => {
                deliver(&mut subscribers.player_part_add, ctx, payload)
            }
            DomainEvent::PlayerRemove(payload) => {
                deliver(&mut subscribers.player_remove, ctx, payload)
            }
            DomainEvent::GameOver => notify(&mut subscribers.game_over, ctx),
            DomainEvent::PebbleAdd(payload) => deliver(&mut subscribers.pebble_add, ctx, payload),
            DomainEvent::PebbleRemove(payload) => {
                deliver(&mut subscribers.pebble_remove, ctx, payload)
            }
        };

        if handled == 0 {
            debug!("No subscribers for {:?}", event.kind());
        }
        handled
    }

    /// Closes the connection. Nothing is dispatched or sent afterwards.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        if let Some(connection) = self.connection.as_mut() {
            connection.close();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::TransportLink;

    #[derive(Default)]
    struct Log {
        entries: Vec<String>,
    }

    fn attached() -> (EventDispatcher<Log>, TransportLink) {
        let endpoint = Endpoint::new("127.0.0.1:8080", false, "room", None).unwrap();
        let mut dispatcher = EventDispatcher::new(endpoint);
        let (connection, link) = Connection::detached();
        assert!(dispatcher.attach(connection));
        (dispatcher, link)
    }

    fn frame(link: &TransportLink, text: &str) {
        link.events
            .send(TransportEvent::Frame(text.to_string()))
            .unwrap();
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let (mut dispatcher, link) = attached();
        dispatcher.on_player_add(|log: &mut Log, p| log.entries.push(format!("first {}", p.player_id)));
        dispatcher.on_player_add(|log: &mut Log, p| log.entries.push(format!("second {}", p.player_id)));

        frame(&link, r#"{"message_type":"new_player","player_id":"p1"}"#);

        let mut log = Log::default();
        assert_eq!(dispatcher.pump(&mut log), 1);
        assert_eq!(log.entries, vec!["first p1", "second p1"]);
    }

    #[test]
    fn test_dispatch_reports_handlers_per_kind() {
        let endpoint = Endpoint::new("127.0.0.1:8080", false, "room", None).unwrap();
        let mut dispatcher: EventDispatcher<Log> = EventDispatcher::new(endpoint);
        dispatcher.on_game_over(|log: &mut Log| log.entries.push("a".into()));
        dispatcher.on_game_over(|log: &mut Log| log.entries.push("b".into()));

        let mut log = Log::default();
        assert_eq!(dispatcher.dispatch(&mut log, &DomainEvent::GameOver), 2);
        assert_eq!(dispatcher.dispatch(&mut log, &DomainEvent::ConnectionOpen), 0);
        assert_eq!(log.entries, vec!["a", "b"]);
    }

    #[test]
    fn test_events_dispatched_in_transport_order() {
        let (mut dispatcher, link) = attached();
        dispatcher.on_connection_open(|log: &mut Log| log.entries.push("open".into()));
        dispatcher.on_you_are(|log: &mut Log, p| log.entries.push(format!("me {}", p.player_id)));
        dispatcher.on_position_update(|log: &mut Log, p| {
            log.entries.push(format!("pos {} {} {}", p.player_id, p.x, p.y))
        });
        dispatcher.on_pebble_add(|log: &mut Log, p| log.entries.push(format!("pebble {}", p.id)));
        dispatcher.on_pebble_remove(|log: &mut Log, p| log.entries.push(format!("unpebble {}", p.id)));
        dispatcher.on_game_over(|log: &mut Log| log.entries.push("over".into()));
        dispatcher.on_connection_close(|log: &mut Log| log.entries.push("close".into()));

        link.events.send(TransportEvent::Open).unwrap();
        frame(&link, r#"{"message_type":"youare","player_id":"p1"}"#);
        frame(&link, r#"{"message_type":"pos","player_id":"p1","x":1,"y":2,"t":0}"#);
        frame(&link, r#"{"message_type":"pebble","resource_id":4,"x":1,"y":2}"#);
        frame(&link, r#"{"message_type":"pebble-remove","resource_id":4}"#);
        frame(&link, r#"{"message_type":"game_over"}"#);
        link.events.send(TransportEvent::Close).unwrap();

        let mut log = Log::default();
        assert_eq!(dispatcher.pump(&mut log), 7);
        assert_eq!(
            log.entries,
            vec![
                "open", "me p1", "pos p1 1 2", "pebble 4", "unpebble 4", "over", "close"
            ]
        );
    }

    #[test]
    fn test_malformed_and_unknown_frames_are_dropped() {
        let (mut dispatcher, link) = attached();
        dispatcher.on_player_remove(|log: &mut Log, p| log.entries.push(p.player_id.clone()));

        frame(&link, "{not json");
        frame(&link, r#"{"message_type":"scoreboard"}"#);
        frame(&link, r#"{"message_type":"disconnect"}"#);
        frame(&link, r#"{"message_type":"disconnect","player_id":"p9"}"#);

        let mut log = Log::default();
        assert_eq!(dispatcher.pump(&mut log), 1);
        assert_eq!(log.entries, vec!["p9"]);
    }

    #[test]
    fn test_error_then_close_both_dispatched() {
        let (mut dispatcher, link) = attached();
        dispatcher.on_connection_error(|log: &mut Log| log.entries.push("error".into()));
        dispatcher.on_connection_close(|log: &mut Log| log.entries.push("close".into()));

        link.events
            .send(TransportEvent::Error("refused".into()))
            .unwrap();
        link.events.send(TransportEvent::Close).unwrap();

        let mut log = Log::default();
        dispatcher.pump(&mut log);
        assert_eq!(log.entries, vec!["error", "close"]);
        assert_eq!(dispatcher.connection_state(), Some(ConnectionState::Errored));
    }

    #[test]
    fn test_send_rotation_requires_open_connection() {
        let (mut dispatcher, mut link) = attached();
        let mut log = Log::default();

        assert!(!dispatcher.send_rotation(0.5));
        assert!(link.outbound.try_recv().is_err());

        link.events.send(TransportEvent::Open).unwrap();
        dispatcher.pump(&mut log);

        assert!(dispatcher.send_rotation(0.5));
        assert_eq!(link.outbound.try_recv().unwrap(), r#"{"t":0.5}"#);
    }

    #[test]
    fn test_send_rotation_without_connection() {
        let endpoint = Endpoint::new("127.0.0.1:8080", false, "room", None).unwrap();
        let mut dispatcher: EventDispatcher<Log> = EventDispatcher::new(endpoint);
        assert!(!dispatcher.send_rotation(1.0));
    }

    #[test]
    fn test_attach_is_once_only() {
        let (mut dispatcher, _link) = attached();
        let (second, _second_link) = Connection::detached();
        assert!(!dispatcher.attach(second));
    }

    #[test]
    fn test_shutdown_stops_dispatch_and_sends() {
        let (mut dispatcher, mut link) = attached();
        dispatcher.on_player_add(|log: &mut Log, p| log.entries.push(p.player_id.clone()));

        link.events.send(TransportEvent::Open).unwrap();
        let mut log = Log::default();
        dispatcher.pump(&mut log);

        dispatcher.shutdown();
        // the receiving end is closed by now, so the late frame may be refused
        let _ = link.events.send(TransportEvent::Frame(
            r#"{"message_type":"new_player","player_id":"late"}"#.to_string(),
        ));

        assert_eq!(dispatcher.pump(&mut log), 0);
        assert!(log.entries.is_empty());
        assert!(!dispatcher.send_rotation(0.1));
        assert!(link.outbound.try_recv().is_err());
        assert!(dispatcher.is_shut_down());
    }
}
