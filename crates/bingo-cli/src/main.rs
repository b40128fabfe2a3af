//! Bingo terminal client
//!
//! Connects to the relay and plays a match from stdin commands:
//! - `create <name>` / `join <code> <name>`
//! - `move <number>` or `move <row> <col>`
//! - `retry`, `exit`, `server <local|remote>`, `reconnect`
//! - `grid`, `status`, `quit`
//!
//! The first argument may select `local` or `remote`, or give a relay URL.

use anyhow::{Context, Result, bail};
use bingo_bridge::{ConnectionConfig, ServerTarget, connector_for};
use bingo_core::{GRID_SIZE, Position, Side};
use bingo_session::{MatchClient, Phase, SessionEvent};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const TICK_INTERVAL: Duration = Duration::from_millis(100);

enum Command {
    Create(String),
    Join(String, String),
    Move(MoveTarget),
    Retry,
    Exit,
    Server(ServerTarget),
    Reconnect,
    Grid,
    Status,
    Quit,
}

enum MoveTarget {
    Number(u8),
    Cell(Position),
}

fn parse_command(line: &str) -> Result<Command> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        bail!("empty command");
    };
    let rest: Vec<&str> = words.collect();

    let command = match (verb, rest.as_slice()) {
        ("create", [name @ ..]) if !name.is_empty() => Command::Create(name.join(" ")),
        ("join", [code, name @ ..]) if !name.is_empty() => {
            Command::Join(code.to_string(), name.join(" "))
        }
        ("move", [number]) => Command::Move(MoveTarget::Number(
            number.parse().context("move takes a number between 1 and 25")?,
        )),
        ("move", [row, col]) => {
            let row: usize = row.parse().context("row must be a number")?;
            let col: usize = col.parse().context("column must be a number")?;
            let pos = Position::new(row, col)
                .with_context(|| format!("cell must be within 0..{}", GRID_SIZE))?;
            Command::Move(MoveTarget::Cell(pos))
        }
        ("retry", []) => Command::Retry,
        ("exit", []) => Command::Exit,
        ("server", [target]) => Command::Server(
            target
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?,
        ),
        ("reconnect", []) => Command::Reconnect,
        ("grid", []) => Command::Grid,
        ("status", []) => Command::Status,
        ("quit", []) => Command::Quit,
        _ => bail!("unrecognized command: {}", line.trim()),
    };
    Ok(command)
}

/// Apply a command; returns false when the client should stop
fn run_command(client: &mut MatchClient, command: Command) -> Result<bool> {
    match command {
        Command::Create(name) => client.create_room(&name)?,
        Command::Join(code, name) => client.join_room(&code, &name)?,
        Command::Move(target) => {
            let played = match target {
                MoveTarget::Number(n) => client.submit_number(n)?,
                MoveTarget::Cell(pos) => client.submit_move(pos)?,
            };
            if !played {
                println!("That move is not allowed right now");
            }
        }
        Command::Retry => {
            if !client.request_retry()? {
                println!("Nothing to retry until the match is decided");
            }
        }
        Command::Exit => client.request_exit(),
        Command::Server(target) => client.switch_server(target),
        Command::Reconnect => client.retry_connection(),
        Command::Grid => print_grid(client),
        Command::Status => print_status(client),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

fn print_grid(client: &MatchClient) {
    let grid = client.grid();
    let last = client.session().and_then(|s| s.last_marked());
    for row in 0..GRID_SIZE {
        let cells: Vec<String> = (0..GRID_SIZE)
            .filter_map(|col| Position::new(row, col))
            .map(|pos| match grid.cell(pos) {
                _ if Some(pos) == last => " ##".to_string(),
                Some(0) | None => "  X".to_string(),
                Some(value) => format!("{:>3}", value),
            })
            .collect();
        println!("{}", cells.join(""));
    }
    println!("{}", "BINGO".chars().take(grid.markers()).collect::<String>());
}

fn print_status(client: &MatchClient) {
    let config = client.config();
    println!(
        "{} relay ({}), {}",
        config.target,
        config.url(),
        if client.is_connected() {
            "connected"
        } else {
            "disconnected"
        }
    );
    match client.session() {
        Some(session) => println!(
            "Room {:?} as {} vs {}, {:?}, {} to move",
            session.room_code(),
            session.local_name(),
            session.peer_name().unwrap_or("-"),
            client.phase(),
            match session.turn() {
                Side::Local => "you",
                Side::Remote => "opponent",
            }
        ),
        None => println!("Not in a room"),
    }
}

fn report(client: &MatchClient, event: SessionEvent) {
    match event {
        SessionEvent::Connected { reconnected: true } => println!("Reconnected"),
        SessionEvent::Connected { reconnected: false } => println!("Connected"),
        SessionEvent::Disconnected { reason, detail, .. } => {
            println!("Disconnected: {} {}", reason, detail)
        }
        SessionEvent::Error(e) => println!("Error: {}", e),
        SessionEvent::RoomCreated { room_code } => {
            println!("Room {} created, waiting for an opponent", room_code)
        }
        SessionEvent::GameReady {
            peer_name,
            first_turn,
            ..
        } => {
            println!("Playing against {}", peer_name);
            if first_turn == Side::Local {
                println!("Your move");
            }
            print_grid(client);
        }
        SessionEvent::MoveApplied {
            call_number,
            marked_by,
            ..
        } => {
            if marked_by == Side::Remote {
                println!("Opponent played {}. Your move", call_number);
                print_grid(client);
            }
        }
        SessionEvent::WinDeclared { winner, local_won } => {
            if local_won {
                println!("You won!");
            } else {
                println!("{} won", winner);
            }
        }
        SessionEvent::DrawDeclared => println!("Draw!"),
        SessionEvent::RetryApplied { next_turn } => {
            println!("Rematch started");
            if next_turn == Side::Local {
                println!("Your move");
            }
            print_grid(client);
        }
        SessionEvent::RoomExited => println!("Left the room"),
    }
}

fn load_config() -> Result<ConnectionConfig> {
    let mut config = ConnectionConfig::from_env();
    if let Some(arg) = std::env::args().nth(1) {
        if let Ok(target) = arg.parse::<ServerTarget>() {
            config.target = target;
        } else if arg.contains("://") {
            match config.target {
                ServerTarget::Local => config.local_url = arg,
                ServerTarget::Remote => config.remote_url = arg,
            }
        } else {
            bail!("expected local, remote or a relay URL, got {:?}", arg);
        }
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config()?;
    info!("Bingo client v{} starting", config.app_version);

    let connector = connector_for(config.transport);
    let mut client = MatchClient::new(config, connector, Handle::current());
    client.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for event in client.tick(Instant::now()) {
                    report(&client, event);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line).and_then(|c| run_command(&mut client, c)) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("Error: {}", e),
                }
            }
        }
    }

    if matches!(client.phase(), Phase::Idle) {
        info!("Shutting down");
    } else {
        info!("Leaving room and shutting down");
    }
    client.shutdown();
    // Give the writer a moment to flush the exit frame
    tokio::time::sleep(TICK_INTERVAL).await;
    Ok(())
}
