//! Camera policy and the host renderer boundary
//!
//! [`ViewPolicy`] turns world changes into renderer calls and decides
//! where the camera looks and how far it is zoomed out.

use crate::world::{Pebble, Player};
use shared::{
    Coord, PebbleId, Rgb, MIN_ZOOM, ZOOM_MIN_PART_COUNT, ZOOM_PART_BASE, ZOOM_PART_DIVISOR,
};

/// Everything a renderer needs to draw one player this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPose {
    pub head: Coord,
    pub rotation: f32,
    pub segments: Vec<Coord>,
}

impl From<&Player> for PlayerPose {
    fn from(player: &Player) -> Self {
        Self {
            head: player.head(),
            rotation: player.rotation,
            segments: player.segment_positions(),
        }
    }
}

/// Drawing backend driven by the view policy.
pub trait HostRenderer {
    fn add_player(&mut self, id: &str, color: Rgb);
    fn remove_player(&mut self, id: &str);
    fn add_player_part(&mut self, id: &str, part_count: usize);
    fn set_player_position(&mut self, id: &str, pose: &PlayerPose);
    fn add_pebble(&mut self, id: PebbleId, position: Coord);
    fn remove_pebble(&mut self, id: PebbleId);
    fn center_camera(&mut self, center: Coord);
    fn set_zoom(&mut self, scale: f32);
    /// Halts the render loop for good.
    fn stop(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: Coord,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: Coord::default(),
            zoom: 1.0,
        }
    }
}

/// Zoom scale for a local player with `part_count` parts.
///
/// `None` while the player is small enough to keep the current zoom.
pub fn zoom_for_part_count(part_count: usize) -> Option<f32> {
    if part_count <= ZOOM_MIN_PART_COUNT {
        return None;
    }

    let scale = (ZOOM_PART_BASE - part_count as f32) / ZOOM_PART_DIVISOR;
    Some(scale.max(MIN_ZOOM))
}

pub struct ViewPolicy<R: HostRenderer> {
    renderer: R,
    camera: Camera,
    stopped: bool,
}

impl<R: HostRenderer> ViewPolicy<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            camera: Camera::default(),
            stopped: false,
        }
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn player_added(&mut self, player: &Player) {
        self.renderer.add_player(&player.id, player.color);
    }

    /// Forwards the new pose. The camera follows the local player on every
    /// update and never follows anyone else.
    pub fn player_moved(&mut self, player: &Player, reported: Coord, is_local: bool) {
        self.renderer
            .set_player_position(&player.id, &PlayerPose::from(player));

        if is_local {
            self.camera.center = reported;
            self.renderer.center_camera(reported);
        }
    }

    /// Refreshes a pose without touching the camera, e.g. after a local turn.
    pub fn player_turned(&mut self, player: &Player) {
        self.renderer
            .set_player_position(&player.id, &PlayerPose::from(player));
    }

    pub fn part_added(&mut self, id: &str, part_count: usize, resize: bool) {
        self.renderer.add_player_part(id, part_count);

        if !resize {
            return;
        }
        if let Some(scale) = zoom_for_part_count(part_count) {
            self.camera.zoom = scale;
            self.renderer.set_zoom(scale);
        }
    }

    pub fn player_removed(&mut self, id: &str) {
        self.renderer.remove_player(id);
    }

    pub fn pebble_added(&mut self, pebble: &Pebble) {
        self.renderer.add_pebble(pebble.id, pebble.position);
    }

    pub fn pebble_removed(&mut self, id: PebbleId) {
        self.renderer.remove_pebble(id);
    }

    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.renderer.stop();
    }
}
