use clap::Parser;
use client::config::{Args, ClientConfig};
use client::dispatcher::EventDispatcher;
use client::game::{EndReason, GameSession, SessionPhase};
use client::input::InputManager;
use client::network::{ConnectionState, TransportError};
use client::rendering::{draw_menu, Renderer};
use log::{error, info};
use macroquad::prelude::*;
use std::time::Instant;
use tokio::runtime::Runtime;

/// Render ticks are normalized to 60 frames per second.
const TICKS_PER_SECOND: f32 = 60.0;

/// Current notice, with the number of notices still queued behind it.
fn notice_banner(session: &GameSession<Renderer>) -> Option<String> {
    let notices = session.notices();
    let current = notices.current()?;
    match notices.pending_len() {
        0 => Some(current.to_string()),
        queued => Some(format!("{} (+{})", current, queued)),
    }
}

struct Match {
    dispatcher: EventDispatcher<GameSession<Renderer>>,
    session: GameSession<Renderer>,
}

enum Screen {
    Menu { status: Option<String> },
    Playing(Match),
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Bubble Snake".to_owned(),
        window_width: args.width as i32,
        window_height: args.height as i32,
        ..Default::default()
    }
}

fn start_match(config: &ClientConfig, runtime: &Runtime) -> Result<Match, TransportError> {
    let endpoint = config.endpoint()?;
    let mut dispatcher = EventDispatcher::new(endpoint);
    GameSession::register(&mut dispatcher);
    dispatcher.connect(runtime.handle());

    let session = GameSession::new(
        Renderer::new(config.width, config.height),
        config.local_color(),
        config.unknown_players,
    );

    Ok(Match {
        dispatcher,
        session,
    })
}

fn end_message(reason: EndReason) -> &'static str {
    match reason {
        EndReason::Closed => "Disconnected from server",
        EndReason::Errored => "Connection error",
        EndReason::Left => "Left the game",
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = match ClientConfig::from_args(Args::parse()) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            eprintln!("{}", e);
            return;
        }
    };

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start network runtime: {}", e);
            return;
        }
    };

    let endpoint_text = config
        .endpoint()
        .map(|endpoint| endpoint.to_string())
        .unwrap_or_default();

    info!("Starting client...");
    info!("Server: {}", endpoint_text);
    info!("Controls: A/D or arrows to turn, Escape to leave, Space to dismiss notices");

    let mut input = InputManager::new();
    let mut screen = Screen::Menu { status: None };

    loop {
        let frame = input.update();
        let mut next = None;

        match &mut screen {
            Screen::Menu { status } => {
                draw_menu(&endpoint_text, status.as_deref());

                if frame.leave {
                    info!("Quitting");
                    break;
                }
                if frame.confirm {
                    match start_match(&config, &runtime) {
                        Ok(game) => next = Some(Screen::Playing(game)),
                        Err(e) => {
                            error!("Failed to start session: {}", e);
                            *status = Some(e.to_string());
                        }
                    }
                }
            }
            Screen::Playing(game) => {
                game.dispatcher.pump(&mut game.session);

                if frame.leave {
                    game.session.leave();
                }

                let delta = get_frame_time() * TICKS_PER_SECOND;
                if let Some(request) = game.session.tick(delta, frame.direction) {
                    game.dispatcher.send_rotation(request.t);
                }

                let now = Instant::now();
                if frame.dismiss_notice {
                    game.session.notices_mut().dismiss(now);
                } else {
                    game.session.notices_mut().expire(now);
                }

                if game.session.is_terminal() && !game.dispatcher.is_shut_down() {
                    info!("Session over: {:?}", game.session.phase());
                    game.dispatcher.shutdown();
                }

                let banner = notice_banner(&game.session);

                match game.session.phase() {
                    SessionPhase::Ended(reason) => {
                        next = Some(Screen::Menu {
                            status: Some(end_message(reason).to_string()),
                        });
                    }
                    SessionPhase::GameOver => {
                        let overlay = game.session.view().is_stopped().then_some("Game over");
                        game.session
                            .view()
                            .renderer()
                            .render(banner.as_deref(), overlay);
                        if frame.confirm {
                            next = Some(Screen::Menu {
                                status: Some("Game over".to_string()),
                            });
                        }
                    }
                    SessionPhase::Connecting | SessionPhase::Playing => {
                        let status = match game.dispatcher.connection_state() {
                            Some(ConnectionState::Connecting) => Some("Connecting..."),
                            _ => banner.as_deref(),
                        };
                        game.session.view().renderer().render(status, None);
                    }
                }
            }
        }

        if let Some(screen_next) = next {
            screen = screen_next;
        }

        next_frame().await;
    }
}
