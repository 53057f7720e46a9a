//! Wire protocol between the game server and the client
//!
//! Inbound traffic is one JSON object per text frame, tagged by `message_type`.
//! Every frame is first read into the loose [`ServerFrame`] record and then
//! narrowed into exactly one [`DomainEvent`]. Outbound traffic has a single
//! shape, [`RotationRequest`].

use crate::{ColorError, PebbleId, PlayerId, Rgb};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("`{message_type}` frame is missing field `{field}`")]
    MissingField {
        message_type: String,
        field: &'static str,
    },
}

/// Generic tagged record every inbound frame deserializes into.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerFrame {
    pub message_type: String,
    pub player_id: Option<PlayerId>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub t: Option<f32>,
    pub resource_id: Option<PebbleId>,
    pub payload: Option<FramePayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FramePayload {
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEventPayload {
    pub player_id: PlayerId,
    /// Raw `RRGGBB` string as sent by the server, only present on `new_player`.
    pub color: Option<String>,
}

impl PlayerEventPayload {
    pub fn new(player_id: impl Into<PlayerId>) -> Self {
        Self {
            player_id: player_id.into(),
            color: None,
        }
    }

    /// `Ok(None)` when no color was sent.
    pub fn rgb(&self) -> Result<Option<Rgb>, ColorError> {
        self.color.as_deref().map(Rgb::from_hex).transpose()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPositionEventPayload {
    pub player_id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub t: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PebblePositionEventPayload {
    pub id: PebbleId,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PebbleEventPayload {
    pub id: PebbleId,
}

/// Every event the client reacts to. Connection lifecycle events carry no payload.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    ConnectionOpen,
    ConnectionError,
    ConnectionClose,
    YouAre(PlayerEventPayload),
    PlayerAdd(PlayerEventPayload),
    PositionUpdate(PlayerPositionEventPayload),
    PlayerPartAdd(PlayerEventPayload),
    PlayerRemove(PlayerEventPayload),
    GameOver,
    PebbleAdd(PebblePositionEventPayload),
    PebbleRemove(PebbleEventPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ConnectionOpen,
    ConnectionError,
    ConnectionClose,
    YouAre,
    PlayerAdd,
    PositionUpdate,
    PlayerPartAdd,
    PlayerRemove,
    GameOver,
    PebbleAdd,
    PebbleRemove,
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::ConnectionOpen => EventKind::ConnectionOpen,
            DomainEvent::ConnectionError => EventKind::ConnectionError,
            DomainEvent::ConnectionClose => EventKind::ConnectionClose,
            DomainEvent::YouAre(_) => EventKind::YouAre,
            DomainEvent::PlayerAdd(_) => EventKind::PlayerAdd,
            DomainEvent::PositionUpdate(_) => EventKind::PositionUpdate,
            DomainEvent::PlayerPartAdd(_) => EventKind::PlayerPartAdd,
            DomainEvent::PlayerRemove(_) => EventKind::PlayerRemove,
            DomainEvent::GameOver => EventKind::GameOver,
            DomainEvent::PebbleAdd(_) => EventKind::PebbleAdd,
            DomainEvent::PebbleRemove(_) => EventKind::PebbleRemove,
        }
    }
}

/// The only message the client ever sends: its current heading in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RotationRequest {
    pub t: f32,
}

impl RotationRequest {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerFrame {
    fn require<T: Clone>(&self, value: &Option<T>, field: &'static str) -> Result<T, ProtocolError> {
        value.clone().ok_or_else(|| ProtocolError::MissingField {
            message_type: self.message_type.clone(),
            field,
        })
    }

    fn player(&self) -> Result<PlayerEventPayload, ProtocolError> {
        Ok(PlayerEventPayload::new(self.require(&self.player_id, "player_id")?))
    }

    /// Narrows the record into a typed event. Unknown tags yield `Ok(None)`.
    pub fn into_event(self) -> Result<Option<DomainEvent>, ProtocolError> {
        let event = match self.message_type.as_str() {
            "youare" => DomainEvent::YouAre(self.player()?),
            "new_player" => DomainEvent::PlayerAdd(PlayerEventPayload {
                player_id: self.require(&self.player_id, "player_id")?,
                color: self.payload.as_ref().and_then(|p| p.color.clone()),
            }),
            "pos" => DomainEvent::PositionUpdate(PlayerPositionEventPayload {
                player_id: self.require(&self.player_id, "player_id")?,
                x: self.require(&self.x, "x")?,
                y: self.require(&self.y, "y")?,
                t: self.t.unwrap_or_default(),
            }),
            "game_over" => DomainEvent::GameOver,
            "pebble" => DomainEvent::PebbleAdd(PebblePositionEventPayload {
                id: self.require(&self.resource_id, "resource_id")?,
                x: self.require(&self.x, "x")?,
                y: self.require(&self.y, "y")?,
            }),
            "pebble-remove" => DomainEvent::PebbleRemove(PebbleEventPayload {
                id: self.require(&self.resource_id, "resource_id")?,
            }),
            "add_part" => DomainEvent::PlayerPartAdd(self.player()?),
            "disconnect" => DomainEvent::PlayerRemove(self.player()?),
            _ => return Ok(None),
        };

        Ok(Some(event))
    }
}

/// Decodes one inbound text frame.
pub fn decode_frame(text: &str) -> Result<Option<DomainEvent>, ProtocolError> {
    let frame: ServerFrame = serde_json::from_str(text)?;
    frame.into_event()
}
