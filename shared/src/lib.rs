use std::fmt;
use thiserror::Error;

pub mod protocol;

pub use protocol::{
    decode_frame, DomainEvent, EventKind, PebbleEventPayload, PebblePositionEventPayload,
    PlayerEventPayload, PlayerPositionEventPayload, ProtocolError, RotationRequest, ServerFrame,
};

/// Slots in every segment's position ring.
pub const SEGMENT_BUFFER_LENGTH: usize = 15;
/// The head anchor sits this far right and down of the server-reported position.
pub const HEAD_ANCHOR_OFFSET: f32 = 64.0;

pub const ZOOM_PART_BASE: f32 = 22.0;
pub const ZOOM_PART_DIVISOR: f32 = 20.0;
pub const MIN_ZOOM: f32 = 0.5;
/// Zoom only changes once a player has more parts than this.
pub const ZOOM_MIN_PART_COUNT: usize = 2;

/// Radians per frame-normalized tick while a turn key is held.
pub const ROTATION_SPEED: f32 = 0.05;

pub const WORLD_WIDTH: f32 = 5000.0;
pub const WORLD_HEIGHT: f32 = 5000.0;
pub const BACKGROUND_LINE_SPACING: f32 = 60.0;

pub const NOTICE_DURATION_MS: u64 = 3000;

pub type PlayerId = String;
pub type PebbleId = u64;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f32,
    pub y: f32,
}

impl Coord {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("expected 6 hex digits, got {0:?}")]
    InvalidLength(String),
    #[error("invalid hex digits in color {0:?}")]
    InvalidDigits(String),
}

/// 3-byte RGB color as exchanged with the server (`RRGGBB`, no leading `#`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 0xFF,
        g: 0xFF,
        b: 0xFF,
    };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `RRGGBB` or `#RRGGBB`.
    pub fn from_hex(input: &str) -> Result<Self, ColorError> {
        let digits = input.strip_prefix('#').unwrap_or(input);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorError::InvalidLength(input.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ColorError::InvalidDigits(input.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Per-channel multipliers in `0.0..=1.0` used to tint white sprites.
    pub fn channel_scale(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_coord_default_is_origin() {
        let coord = Coord::default();
        assert_eq!(coord.x, 0.0);
        assert_eq!(coord.y, 0.0);
    }

    #[test]
    fn test_coord_offset() {
        let coord = Coord::new(10.0, 20.0).offset(HEAD_ANCHOR_OFFSET, HEAD_ANCHOR_OFFSET);
        assert_eq!(coord, Coord::new(74.0, 84.0));
    }

    #[test]
    fn test_rgb_default_is_white() {
        assert_eq!(Rgb::default(), Rgb::new(255, 255, 255));
        assert_eq!(Rgb::default().to_hex(), "FFFFFF");
    }

    #[test]
    fn test_rgb_from_hex() {
        assert_eq!(Rgb::from_hex("ff8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(Rgb::from_hex("#00A0ff").unwrap(), Rgb::new(0, 160, 255));
    }

    #[test]
    fn test_rgb_from_hex_rejects_bad_input() {
        assert_eq!(
            Rgb::from_hex("fff"),
            Err(ColorError::InvalidLength("fff".to_string()))
        );
        assert_eq!(
            Rgb::from_hex("12345z"),
            Err(ColorError::InvalidDigits("12345z".to_string()))
        );
        assert!(Rgb::from_hex("").is_err());
        assert!(Rgb::from_hex("#1234567").is_err());
        assert!(Rgb::from_hex("ééé").is_err());
    }

    #[test]
    fn test_rgb_hex_is_uppercase_without_hash() {
        let color = Rgb::new(0xab, 0x01, 0xcd);
        assert_eq!(color.to_hex(), "AB01CD");
        assert_eq!(color.to_string(), "#AB01CD");
    }

    #[test]
    fn test_rgb_channel_scale() {
        let [r, g, b] = Rgb::new(255, 51, 0).channel_scale();
        assert_approx_eq!(r, 1.0, 1e-6);
        assert_approx_eq!(g, 0.2, 1e-6);
        assert_approx_eq!(b, 0.0, 1e-6);
    }

    #[test]
    fn test_zoom_constants() {
        assert_eq!(SEGMENT_BUFFER_LENGTH, 15);
        assert_approx_eq!((ZOOM_PART_BASE - 3.0) / ZOOM_PART_DIVISOR, 0.95, 1e-6);
        assert_eq!((ZOOM_PART_BASE - 22.0) / ZOOM_PART_DIVISOR, 0.0);
        assert_eq!(MIN_ZOOM, 0.5);
    }
}
