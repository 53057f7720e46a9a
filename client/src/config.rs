//! Command line configuration

use crate::network::{Endpoint, TransportError};
use crate::world::UnknownPlayerPolicy;
use clap::Parser;
use shared::{ColorError, Rgb};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid --color: {0}")]
    Color(#[from] ColorError),
    #[error(transparent)]
    Endpoint(#[from] TransportError),
    #[error("room key must not be empty")]
    EmptyRoom,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Game server host and port
    #[arg(long, env = "BUBBLESNAKE_HOST", default_value = "127.0.0.1:8080")]
    pub host: String,

    /// Connect with wss instead of ws
    #[arg(long, env = "BUBBLESNAKE_SECURE")]
    pub secure: bool,

    /// Room key to join
    #[arg(short = 'r', long)]
    pub room: String,

    /// Snake color as 6 hex digits, e.g. FF8800
    #[arg(short = 'c', long)]
    pub color: Option<String>,

    /// Create players on their first position update instead of waiting
    /// for the server to announce them
    #[arg(long)]
    pub materialize_unknown_players: bool,

    /// Window width
    #[arg(short = 'w', long, default_value = "1024")]
    pub width: usize,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "768")]
    pub height: usize,
}

/// Validated client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub secure: bool,
    pub room: String,
    pub color: Option<Rgb>,
    pub unknown_players: UnknownPlayerPolicy,
    pub width: usize,
    pub height: usize,
}

impl ClientConfig {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        if args.room.trim().is_empty() {
            return Err(ConfigError::EmptyRoom);
        }

        let color = args.color.as_deref().map(Rgb::from_hex).transpose()?;
        let unknown_players = if args.materialize_unknown_players {
            UnknownPlayerPolicy::Materialize
        } else {
            UnknownPlayerPolicy::Drop
        };

        let config = Self {
            host: args.host,
            secure: args.secure,
            room: args.room,
            color,
            unknown_players,
            width: args.width,
            height: args.height,
        };
        // fail early on a host that can't form a URL
        config.endpoint()?;
        Ok(config)
    }

    pub fn endpoint(&self) -> Result<Endpoint, TransportError> {
        Endpoint::new(&self.host, self.secure, &self.room, self.color)
    }

    /// Color for the local snake before the server echoes anything back.
    pub fn local_color(&self) -> Rgb {
        self.color.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("client").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--room", "lobby"]);
        assert_eq!(args.width, 1024);
        assert_eq!(args.height, 768);
        assert!(!args.materialize_unknown_players);

        let config = ClientConfig::from_args(args).unwrap();
        assert_eq!(config.color, None);
        assert_eq!(config.local_color(), Rgb::WHITE);
        assert_eq!(config.unknown_players, UnknownPlayerPolicy::Drop);
    }

    #[test]
    fn test_room_is_required() {
        assert!(Args::try_parse_from(["client"]).is_err());
    }

    #[test]
    fn test_color_and_endpoint() {
        let args = parse(&[
            "--host",
            "snake.example.com",
            "--secure",
            "--room",
            "r1",
            "--color",
            "#00ff7f",
            "--materialize-unknown-players",
        ]);
        let config = ClientConfig::from_args(args).unwrap();

        assert_eq!(config.color, Some(Rgb::new(0, 255, 127)));
        assert_eq!(config.unknown_players, UnknownPlayerPolicy::Materialize);
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "wss://snake.example.com/ws?rk=r1&color=00FF7F"
        );
    }

    #[test]
    fn test_bad_color_rejected() {
        let args = parse(&["--room", "r1", "--color", "12345"]);
        assert!(matches!(
            ClientConfig::from_args(args),
            Err(ConfigError::Color(_))
        ));
    }

    #[test]
    fn test_empty_room_rejected() {
        let args = parse(&["--room", " "]);
        assert!(matches!(
            ClientConfig::from_args(args),
            Err(ConfigError::EmptyRoom)
        ));
    }
}
