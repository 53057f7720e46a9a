//! Player and pebble state store
//!
//! The store is the only place that knows which players and pebbles exist.
//! Callers get explicit outcomes back (created, removed, dropped) instead of
//! checking membership themselves before every mutation.

use crate::trail::Trail;
use log::{debug, warn};
use shared::{Coord, PebbleId, PlayerId, Rgb, HEAD_ANCHOR_OFFSET};
use std::collections::HashMap;

/// What to do with a position update for a player the store has never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPlayerPolicy {
    /// Ignore the update. The server always announces players first.
    #[default]
    Drop,
    /// Create the player on the fly, then apply the update.
    Materialize,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub color: Rgb,
    /// Heading in radians.
    pub rotation: f32,
    head: Coord,
    trail: Trail,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, color: Rgb) -> Self {
        Self {
            id: id.into(),
            color,
            rotation: 0.0,
            head: Coord::default(),
            trail: Trail::new(),
        }
    }

    /// Head anchor in world units.
    pub fn head(&self) -> Coord {
        self.head
    }

    pub fn part_count(&self) -> usize {
        self.trail.len()
    }

    pub fn segment_positions(&self) -> Vec<Coord> {
        self.trail.positions()
    }

    /// Moves the head to the server position and shifts the old anchor down
    /// the trail.
    pub fn update_position(&mut self, x: f32, y: f32) {
        let previous = self.head;
        self.head = Coord::new(x, y).offset(HEAD_ANCHOR_OFFSET, HEAD_ANCHOR_OFFSET);
        self.trail.propagate(previous);
    }

    pub fn add_part(&mut self) -> usize {
        self.trail.grow()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pebble {
    pub id: PebbleId,
    pub position: Coord,
}

/// Result of binding the local player identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAssignment {
    /// Identity bound; `created` tells whether a new player entry was made.
    Assigned { created: bool },
    /// Same identity announced again.
    AlreadyAssigned,
    /// A different identity was already bound; the new one is ignored.
    Conflict { existing: PlayerId },
}

#[derive(Debug, Default)]
pub struct WorldState {
    players: HashMap<PlayerId, Player>,
    pebbles: HashMap<PebbleId, Pebble>,
    local_id: Option<PlayerId>,
    unknown_players: UnknownPlayerPolicy,
}

impl WorldState {
    pub fn new(unknown_players: UnknownPlayerPolicy) -> Self {
        Self {
            unknown_players,
            ..Default::default()
        }
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn is_local(&self, id: &str) -> bool {
        self.local_id.as_deref() == Some(id)
    }

    /// Binds the local player identity. Only the first assignment sticks.
    pub fn assign_local(&mut self, id: &str, color: Rgb) -> LocalAssignment {
        match self.local_id.as_deref() {
            Some(existing) if existing == id => return LocalAssignment::AlreadyAssigned,
            Some(existing) => {
                warn!(
                    "Ignoring second identity {} (already playing as {})",
                    id, existing
                );
                return LocalAssignment::Conflict {
                    existing: existing.to_string(),
                };
            }
            None => {}
        }

        self.local_id = Some(id.to_string());
        let created = self.add_player(id, color);
        LocalAssignment::Assigned { created }
    }

    /// Creates a player if the id is new. Returns whether an entry was created.
    pub fn add_player(&mut self, id: &str, color: Rgb) -> bool {
        if self.players.contains_key(id) {
            debug!("Player {} already present", id);
            return false;
        }

        self.players.insert(id.to_string(), Player::new(id, color));
        true
    }

    /// Applies a server position. Returns `None` when the update was dropped.
    ///
    /// The local player's rotation is integrated locally, so `t` only
    /// applies to remote players.
    pub fn set_player_position(&mut self, id: &str, x: f32, y: f32, t: f32) -> Option<&Player> {
        if !self.players.contains_key(id) {
            match self.unknown_players {
                UnknownPlayerPolicy::Drop => {
                    debug!("Dropping position for unknown player {}", id);
                    return None;
                }
                UnknownPlayerPolicy::Materialize => {
                    debug!("Materializing unknown player {}", id);
                    self.add_player(id, Rgb::default());
                }
            }
        }

        let is_local = self.is_local(id);
        let player = self.players.get_mut(id)?;
        player.update_position(x, y);
        if !is_local {
            player.rotation = t;
        }
        Some(&*player)
    }

    /// Sets the local player's heading. No-op before the identity is known.
    pub fn set_local_rotation(&mut self, rotation: f32) {
        if let Some(id) = self.local_id.as_deref() {
            if let Some(player) = self.players.get_mut(id) {
                player.rotation = rotation;
            }
        }
    }

    /// Appends a segment. Returns the new part count, or `None` for unknown ids.
    pub fn add_player_part(&mut self, id: &str) -> Option<usize> {
        match self.players.get_mut(id) {
            Some(player) => Some(player.add_part()),
            None => {
                debug!("Part added for unknown player {}", id);
                None
            }
        }
    }

    pub fn remove_player(&mut self, id: &str) -> Option<Player> {
        let removed = self.players.remove(id);
        if removed.is_none() {
            debug!("Remove for unknown player {}", id);
        }
        removed
    }

    /// Registers a pebble. An id that is still alive is left untouched.
    pub fn add_pebble(&mut self, id: PebbleId, x: f32, y: f32) -> bool {
        if self.pebbles.contains_key(&id) {
            debug!("Pebble {} already present", id);
            return false;
        }

        self.pebbles.insert(
            id,
            Pebble {
                id,
                position: Coord::new(x, y),
            },
        );
        true
    }

    pub fn remove_pebble(&mut self, id: PebbleId) -> Option<Pebble> {
        let removed = self.pebbles.remove(&id);
        if removed.is_none() {
            debug!("Pebble {} not found for removal", id);
        }
        removed
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn pebble(&self, id: PebbleId) -> Option<&Pebble> {
        self.pebbles.get(&id)
    }

    pub fn part_count(&self, id: &str) -> Option<usize> {
        self.players.get(id).map(Player::part_count)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn pebble_count(&self) -> usize {
        self.pebbles.len()
    }
}
