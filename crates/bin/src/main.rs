//! Culture - terminal front end for hosting or joining a game.

mod render;
mod terminal;

use anyhow::Context;
use clap::{Parser, Subcommand};
use game::{Board, ColorRegistry, Config, GuestHandshake, JoinSession, Move, Operator, SessionError};
use protocol::HOST_TEAM;
use protocol::packets::MoveRequest;
use tokio::net::{TcpListener, TcpStream};
use tracing::info;
use tracing_subscriber::EnvFilter;

use terminal::TerminalOperator;

#[derive(Parser)]
#[command(name = "culture")]
#[command(about = "Chain-reaction territory game for the terminal", version)]
struct Cli {
    /// Run an offline check of move packing and the board
    #[arg(long)]
    test: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Host a game and wait for guests
    Host {
        /// Board size; anything that is not a number means the default
        size: Option<String>,
    },

    /// Join a game hosted elsewhere
    Join {
        /// host:port, the port defaults to the configured one
        address: String,

        /// Shown to the host with the join request
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stdout belongs to the game, logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let Cli { test, command } = Cli::parse();
    if !test && command.is_none() {
        return Ok(());
    }

    let mut operator = TerminalOperator::spawn()?;
    let session = async move {
        if test {
            return smoke_test(&mut operator).await;
        }
        let config = Config::load()?;
        match command {
            Some(Commands::Host { size }) => host(&config, size, &mut operator).await,
            Some(Commands::Join { address, message }) => {
                join(&config, address, message, &mut operator).await
            }
            None => Ok(()),
        }
    };

    tokio::select! {
        result = session => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    }
}

async fn host(config: &Config, size: Option<String>, operator: &mut TerminalOperator) -> anyhow::Result<()> {
    let requested = size
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse().ok());
    let size = config.board.resolve(requested)?;

    let listener = TcpListener::bind((config.server.bind.as_str(), config.server.port))
        .await
        .with_context(|| format!("binding {}:{}", config.server.bind, config.server.port))?;
    info!(addr = %listener.local_addr()?, size, "Hosting");
    println!("hosting a {size}x{size} game on port {}", config.server.port);

    let lobby = JoinSession::new(size, &config.palette);
    let game = lobby.accept_until_start(listener, operator).await?;
    game.run(operator).await?;
    Ok(())
}

async fn join(
    config: &Config,
    address: String,
    message: Option<String>,
    operator: &mut TerminalOperator,
) -> anyhow::Result<()> {
    let address = if address.contains(':') {
        address
    } else {
        format!("{address}:{}", config.server.port)
    };
    let stream = TcpStream::connect(&address)
        .await
        .with_context(|| format!("connecting to {address}"))?;
    stream.set_nodelay(true)?;

    let message = message.or_else(|| config.guest.join_message.clone());
    let handshake = match GuestHandshake::join(stream, message.as_deref()).await {
        Ok(handshake) => handshake,
        Err(SessionError::Denied { code: 0, .. }) => {
            println!("host denied join request");
            return Ok(());
        }
        Err(e @ SessionError::Denied { .. }) => {
            println!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mirror = handshake.wait_for_start(operator).await?;
    mirror.run(operator).await?;
    Ok(())
}

/// Ask for one position on an empty board, show how it travels, apply it.
async fn smoke_test(operator: &mut TerminalOperator) -> anyhow::Result<()> {
    let mut board = Board::new(8);
    let colors = ColorRegistry::initial_defaults();

    let position = operator.choose_move(&board, HOST_TEAM).await?;
    let packed = MoveRequest::new(position.x as i32, position.y as i32).pack();
    println!("{packed}");
    println!("{} {}", packed >> 32, packed & 0xffff_ffff);

    board.apply_move(position, HOST_TEAM);
    operator.render_move(
        Move {
            position,
            team: HOST_TEAM,
        },
        &board,
        &colors,
    );
    Ok(())
}
