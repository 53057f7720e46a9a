use crate::view::{Camera, HostRenderer, PlayerPose};
use log::debug;
use macroquad::prelude::*;
use shared::{
    Coord, PebbleId, PlayerId, Rgb, BACKGROUND_LINE_SPACING, WORLD_HEIGHT, WORLD_WIDTH,
};
use std::collections::HashMap;

const HEAD_RADIUS: f32 = 64.0;
const SEGMENT_RADIUS: f32 = 56.0;
const PEBBLE_RADIUS: f32 = 12.0;
const EYE_OFFSET: f32 = 28.0;
const EYE_SPREAD: f32 = 0.5;

const BACKGROUND: Color = Color::new(0.10, 0.10, 0.10, 1.0);
const GRID_LINE: Color = Color::new(0.18, 0.18, 0.18, 1.0);
const BORDER: Color = Color::new(0.55, 0.15, 0.15, 1.0);
const BODY_BASE: Color = Color::new(0.85, 0.85, 0.85, 1.0);
const HEAD_BASE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
const PEBBLE_COLOR: Color = Color::new(0.95, 0.80, 0.25, 1.0);

/// Scales each channel of `base` by the player color; alpha is kept.
pub fn tint(base: Color, color: Rgb) -> Color {
    let [r, g, b] = color.channel_scale();
    Color::new(base.r * r, base.g * g, base.b * b, base.a)
}

/// Heights of the horizontal background lines: every `spacing` units,
/// starting half a spacing below the top edge.
pub fn background_rows(spacing: f32, height: f32) -> Vec<f32> {
    let mut rows = Vec::new();
    let mut y = spacing / 2.0;
    while y < height {
        rows.push(y);
        y += spacing;
    }
    rows
}

/// Drawable state of one player.
#[derive(Debug, Clone)]
pub struct PlayerActor {
    pub color: Rgb,
    pub pose: PlayerPose,
    pub part_count: usize,
}

impl PlayerActor {
    fn new(color: Rgb) -> Self {
        Self {
            color,
            pose: PlayerPose {
                head: Coord::default(),
                rotation: 0.0,
                segments: Vec::new(),
            },
            part_count: 1,
        }
    }
}

/// Macroquad scene fed through [`HostRenderer`]. Once stopped, the scene
/// keeps its last state and ignores every further update.
pub struct Renderer {
    width: f32,
    height: f32,
    players: HashMap<PlayerId, PlayerActor>,
    pebbles: HashMap<PebbleId, Coord>,
    camera: Camera,
    stopped: bool,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            width: width as f32,
            height: height as f32,
            players: HashMap::new(),
            pebbles: HashMap::new(),
            camera: Camera::default(),
            stopped: false,
        }
    }

    pub fn actor(&self, id: &str) -> Option<&PlayerActor> {
        self.players.get(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn pebble_count(&self) -> usize {
        self.pebbles.len()
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn render(&self, notice: Option<&str>, overlay: Option<&str>) {
        clear_background(BACKGROUND);

        let scale = self.camera.zoom;
        set_camera(&Camera2D {
            target: vec2(self.camera.center.x, self.camera.center.y),
            zoom: vec2(scale * 2.0 / self.width, -scale * 2.0 / self.height),
            ..Default::default()
        });

        self.draw_background();

        for position in self.pebbles.values() {
            draw_circle(position.x, position.y, PEBBLE_RADIUS, PEBBLE_COLOR);
        }

        for actor in self.players.values() {
            self.draw_player(actor);
        }

        set_default_camera();

        if let Some(message) = notice {
            self.draw_notice(message);
        }
        if let Some(message) = overlay {
            self.draw_overlay(message);
        }
    }

    fn draw_background(&self) {
        for y in background_rows(BACKGROUND_LINE_SPACING, WORLD_HEIGHT) {
            draw_line(0.0, y, WORLD_WIDTH, y, 2.0, GRID_LINE);
        }

        draw_rectangle_lines(0.0, 0.0, WORLD_WIDTH, WORLD_HEIGHT, 8.0, BORDER);
    }

    fn draw_player(&self, actor: &PlayerActor) {
        let body = tint(BODY_BASE, actor.color);
        // tail first so nearer segments overlap it
        for segment in actor.pose.segments.iter().rev() {
            draw_circle(segment.x, segment.y, SEGMENT_RADIUS, body);
        }

        let head = actor.pose.head;
        draw_circle(head.x, head.y, HEAD_RADIUS, tint(HEAD_BASE, actor.color));
        self.draw_face(head, actor.pose.rotation);
    }

    fn draw_face(&self, head: Coord, rotation: f32) {
        for side in [-1.0, 1.0] {
            let angle = rotation + side * EYE_SPREAD;
            let eye_x = head.x + angle.cos() * EYE_OFFSET;
            let eye_y = head.y + angle.sin() * EYE_OFFSET;
            draw_circle(eye_x, eye_y, 10.0, WHITE);
            draw_circle(
                eye_x + rotation.cos() * 4.0,
                eye_y + rotation.sin() * 4.0,
                5.0,
                BLACK,
            );
        }
    }

    fn draw_notice(&self, message: &str) {
        let size = measure_text(message, None, 24, 1.0);
        let x = (self.width - size.width) / 2.0;
        draw_rectangle(
            x - 12.0,
            10.0,
            size.width + 24.0,
            36.0,
            Color::from_rgba(0, 0, 0, 160),
        );
        draw_text(message, x, 36.0, 24.0, WHITE);
    }

    fn draw_overlay(&self, message: &str) {
        draw_rectangle(
            0.0,
            0.0,
            self.width,
            self.height,
            Color::from_rgba(0, 0, 0, 120),
        );
        let size = measure_text(message, None, 48, 1.0);
        draw_text(
            message,
            (self.width - size.width) / 2.0,
            self.height / 2.0,
            48.0,
            WHITE,
        );
        draw_text(
            "Enter: back to menu",
            self.width / 2.0 - 90.0,
            self.height / 2.0 + 40.0,
            20.0,
            GRAY,
        );
    }
}

impl HostRenderer for Renderer {
    fn add_player(&mut self, id: &str, color: Rgb) {
        if self.stopped {
            return;
        }
        self.players
            .entry(id.to_string())
            .or_insert_with(|| PlayerActor::new(color));
    }

    fn remove_player(&mut self, id: &str) {
        if self.stopped {
            return;
        }
        self.players.remove(id);
    }

    fn add_player_part(&mut self, id: &str, part_count: usize) {
        if self.stopped {
            return;
        }
        if let Some(actor) = self.players.get_mut(id) {
            actor.part_count = part_count;
        }
    }

    fn set_player_position(&mut self, id: &str, pose: &PlayerPose) {
        if self.stopped {
            return;
        }
        if let Some(actor) = self.players.get_mut(id) {
            actor.pose = pose.clone();
        }
    }

    fn add_pebble(&mut self, id: PebbleId, position: Coord) {
        if self.stopped {
            return;
        }
        self.pebbles.insert(id, position);
    }

    fn remove_pebble(&mut self, id: PebbleId) {
        if self.stopped {
            return;
        }
        self.pebbles.remove(&id);
    }

    fn center_camera(&mut self, center: Coord) {
        if self.stopped {
            return;
        }
        self.camera.center = center;
    }

    fn set_zoom(&mut self, scale: f32) {
        if self.stopped {
            return;
        }
        self.camera.zoom = scale;
    }

    fn stop(&mut self) {
        debug!("Renderer stopped");
        self.stopped = true;
    }
}

/// Lobby screen shown before joining and after a session ends.
pub fn draw_menu(endpoint: &str, status: Option<&str>) {
    clear_background(BACKGROUND);

    let width = screen_width();
    let height = screen_height();

    let title = "Bubble Snake";
    let size = measure_text(title, None, 64, 1.0);
    draw_text(title, (width - size.width) / 2.0, height / 3.0, 64.0, WHITE);

    draw_text(endpoint, 20.0, height - 20.0, 16.0, GRAY);
    draw_text(
        "Enter: join   Escape: quit   A/D: turn",
        width / 2.0 - 170.0,
        height / 2.0,
        24.0,
        LIGHTGRAY,
    );

    if let Some(status) = status {
        let size = measure_text(status, None, 24, 1.0);
        draw_text(
            status,
            (width - size.width) / 2.0,
            height / 2.0 + 40.0,
            24.0,
            ORANGE,
        );
    }
}
