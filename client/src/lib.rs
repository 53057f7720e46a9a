//! # Bubble Snake Client Library
//!
//! Client-side synchronization engine for the multiplayer snake game. It keeps
//! a local mirror of every player and pebble in sync with the authoritative
//! server, builds a discretely spaced body behind each head, and reports the
//! local player's heading back to the server.
//!
//! ## Architecture Overview
//!
//! The server owns positions, growth, pebbles and the end of the game. The
//! client only owns its own heading. Everything else arrives as JSON text
//! frames over one WebSocket and is applied in arrival order.
//!
//! ### Single Mutation Thread
//! Socket I/O runs as a task on a tokio runtime and hands raw notifications
//! over a channel. The render loop drains that channel once per frame through
//! [`dispatcher::EventDispatcher::pump`], so world state, camera and renderer
//! are only ever touched from one thread and need no locks.
//!
//! ### Trailing Segments
//! A body is a chain of segments, each buffering the last positions it was
//! given and moving only once its buffer has wrapped. Every update pushes the
//! previous head anchor into the first segment and whatever falls out of one
//! segment into the next. See [`trail`].
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! WebSocket transport: endpoint URL, connection state, best-effort sends.
//!
//! ### Dispatcher Module (`dispatcher`)
//! Decodes frames into typed events and hands them to subscribers in
//! registration order.
//!
//! ### World and Trail Modules (`world`, `trail`)
//! Player and pebble store with explicit outcomes; the segment trail engine.
//!
//! ### View Module (`view`)
//! Camera follow, zoom policy and the [`view::HostRenderer`] boundary.
//!
//! ### Game Module (`game`)
//! One session wiring the store, view, heading integrator and notices to
//! the dispatcher.
//!
//! ### Input, Notices, Rendering and Config
//! Key sampling and heading integration, on-screen notices, the macroquad
//! renderer, and command line configuration.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::dispatcher::EventDispatcher;
//! use client::game::GameSession;
//! use client::input::TurnDirection;
//! use client::network::Endpoint;
//! use client::rendering::Renderer;
//! use client::world::UnknownPlayerPolicy;
//! use shared::Rgb;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = tokio::runtime::Runtime::new()?;
//! let endpoint = Endpoint::new("127.0.0.1:8080", false, "lobby", None)?;
//!
//! let mut dispatcher = EventDispatcher::new(endpoint);
//! GameSession::register(&mut dispatcher);
//! dispatcher.connect(runtime.handle());
//!
//! let mut session = GameSession::new(
//!     Renderer::new(1024, 768),
//!     Rgb::default(),
//!     UnknownPlayerPolicy::Drop,
//! );
//!
//! // once per frame
//! dispatcher.pump(&mut session);
//! if let Some(request) = session.tick(1.0, TurnDirection::Right) {
//!     dispatcher.send_rotation(request.t);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod game;
pub mod input;
pub mod network;
pub mod notices;
pub mod rendering;
pub mod trail;
pub mod view;
pub mod world;
