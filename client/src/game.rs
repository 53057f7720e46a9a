//! One game session: world state, camera and local heading wired to events

use crate::dispatcher::EventDispatcher;
use crate::input::{RotationIntegrator, TurnDirection};
use crate::notices::NoticeBoard;
use crate::view::{HostRenderer, ViewPolicy};
use crate::world::{LocalAssignment, UnknownPlayerPolicy, WorldState};
use log::{debug, info, warn};
use shared::{
    Coord, PebbleEventPayload, PebblePositionEventPayload, PlayerEventPayload,
    PlayerPositionEventPayload, Rgb, RotationRequest,
};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Closed,
    Errored,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Connecting,
    Playing,
    GameOver,
    Ended(EndReason),
}

pub struct GameSession<R: HostRenderer> {
    world: WorldState,
    view: ViewPolicy<R>,
    heading: RotationIntegrator,
    notices: NoticeBoard,
    phase: SessionPhase,
    local_color: Rgb,
}

impl<R: HostRenderer> GameSession<R> {
    pub fn new(renderer: R, local_color: Rgb, unknown_players: UnknownPlayerPolicy) -> Self {
        Self {
            world: WorldState::new(unknown_players),
            view: ViewPolicy::new(renderer),
            heading: RotationIntegrator::new(),
            notices: NoticeBoard::new(),
            phase: SessionPhase::Connecting,
            local_color,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn view(&self) -> &ViewPolicy<R> {
        &self.view
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    /// Game over or ended: the connection should be torn down.
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, SessionPhase::GameOver | SessionPhase::Ended(_))
    }

    fn accepts_events(&self) -> bool {
        matches!(self.phase, SessionPhase::Connecting | SessionPhase::Playing)
    }

    pub fn connection_opened(&mut self) {
        if self.phase == SessionPhase::Connecting {
            info!("Session started");
            self.phase = SessionPhase::Playing;
        }
    }

    pub fn connection_failed(&mut self) {
        self.end(EndReason::Errored);
    }

    pub fn connection_closed(&mut self) {
        self.end(EndReason::Closed);
    }

    /// Leaves the session on the player's request.
    pub fn leave(&mut self) {
        self.end(EndReason::Left);
    }

    fn end(&mut self, reason: EndReason) {
        if self.is_terminal() {
            return;
        }
        info!("Session ended: {:?}", reason);
        self.phase = SessionPhase::Ended(reason);
    }

    pub fn you_are(&mut self, payload: &PlayerEventPayload) {
        if !self.accepts_events() {
            return;
        }

        match self.world.assign_local(&payload.player_id, self.local_color) {
            LocalAssignment::Assigned { created } => {
                info!("Playing as {}", payload.player_id);
                if created {
                    if let Some(player) = self.world.player(&payload.player_id) {
                        self.view.player_added(player);
                    }
                }
            }
            LocalAssignment::AlreadyAssigned | LocalAssignment::Conflict { .. } => {}
        }
    }

    pub fn player_added(&mut self, payload: &PlayerEventPayload) {
        if !self.accepts_events() {
            return;
        }

        let color = match payload.rgb() {
            Ok(color) => color.unwrap_or_default(),
            Err(e) => {
                warn!("Invalid color for player {}: {}", payload.player_id, e);
                Rgb::default()
            }
        };

        if self.world.add_player(&payload.player_id, color) {
            if let Some(player) = self.world.player(&payload.player_id) {
                self.view.player_added(player);
            }
        }
    }

    pub fn position_updated(&mut self, payload: &PlayerPositionEventPayload) {
        if !self.accepts_events() {
            return;
        }

        let id = payload.player_id.as_str();
        let known = self.world.player(id).is_some();
        let is_local = self.world.is_local(id);

        if let Some(player) = self
            .world
            .set_player_position(id, payload.x, payload.y, payload.t)
        {
            if !known {
                self.view.player_added(player);
            }
            self.view
                .player_moved(player, Coord::new(payload.x, payload.y), is_local);
        }
    }

    pub fn part_added(&mut self, payload: &PlayerEventPayload) {
        if !self.accepts_events() {
            return;
        }

        let id = payload.player_id.as_str();
        if let Some(count) = self.world.add_player_part(id) {
            self.view.part_added(id, count, self.world.is_local(id));
        }
    }

    pub fn player_removed(&mut self, payload: &PlayerEventPayload) {
        if !self.accepts_events() {
            return;
        }

        if self.world.remove_player(&payload.player_id).is_some() {
            self.view.player_removed(&payload.player_id);
        }
    }

    pub fn pebble_added(&mut self, payload: &PebblePositionEventPayload) {
        if !self.accepts_events() {
            return;
        }

        if self.world.add_pebble(payload.id, payload.x, payload.y) {
            if let Some(pebble) = self.world.pebble(payload.id) {
                self.view.pebble_added(pebble);
            }
        }
    }

    pub fn pebble_removed(&mut self, payload: &PebbleEventPayload) {
        if !self.accepts_events() {
            return;
        }

        if self.world.remove_pebble(payload.id).is_some() {
            self.view.pebble_removed(payload.id);
        }
    }

    pub fn game_over(&mut self) {
        if !self.accepts_events() {
            return;
        }

        info!("Game over");
        self.phase = SessionPhase::GameOver;
        self.view.stop();
    }

    /// Advances the local heading by one render tick.
    ///
    /// Returns the rotation to report, or `None` once the session no longer
    /// talks to the server.
    pub fn tick(&mut self, delta: f32, direction: TurnDirection) -> Option<RotationRequest> {
        if self.phase != SessionPhase::Playing {
            return None;
        }

        let angle = self.heading.advance(delta, direction);
        self.world.set_local_rotation(angle);
        if direction != TurnDirection::Straight {
            if let Some(player) = self.world.local_id().and_then(|id| self.world.player(id)) {
                self.view.player_turned(player);
            }
        }

        Some(RotationRequest { t: angle })
    }

    fn notify(&mut self, message: String) {
        debug!("Notice: {}", message);
        self.notices.push(message, Instant::now());
    }
}

impl<R: HostRenderer + 'static> GameSession<R> {
    /// Subscribes the session to every event kind. Notices are a second,
    /// independent subscriber after the state handlers.
    pub fn register(dispatcher: &mut EventDispatcher<Self>) {
        dispatcher.on_connection_open(|session: &mut Self| session.connection_opened());
        dispatcher.on_connection_error(|session: &mut Self| session.connection_failed());
        dispatcher.on_connection_close(|session: &mut Self| session.connection_closed());
        dispatcher.on_you_are(|session: &mut Self, p| session.you_are(p));
        dispatcher.on_player_add(|session: &mut Self, p| session.player_added(p));
        dispatcher.on_position_update(|session: &mut Self, p| session.position_updated(p));
        dispatcher.on_player_part_add(|session: &mut Self, p| session.part_added(p));
        dispatcher.on_player_remove(|session: &mut Self, p| session.player_removed(p));
        dispatcher.on_game_over(|session: &mut Self| session.game_over());
        dispatcher.on_pebble_add(|session: &mut Self, p| session.pebble_added(p));
        dispatcher.on_pebble_remove(|session: &mut Self, p| session.pebble_removed(p));

        dispatcher.on_player_add(|session: &mut Self, p| {
            if !session.world.is_local(&p.player_id) {
                session.notify(format!("{} joined", p.player_id));
            }
        });
        dispatcher.on_player_remove(|session: &mut Self, p| {
            session.notify(format!("{} left", p.player_id));
        });
        dispatcher.on_game_over(|session: &mut Self| session.notify("Game over".to_string()));
        dispatcher.on_connection_error(|session: &mut Self| {
            session.notify("Connection lost".to_string())
        });
    }
}
