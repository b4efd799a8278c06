use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::Instant;

use clap::Parser;
use ra::{visualize_snapshot, Level, ServerEvent, Visibility};
use ra_client::{
    connect, spawn_reader, ClientConfig, FileStorage, Intent, ReconnectAction, SyncController,
    SystemClock, TcpChannel, TransportEvent,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type Controller = SyncController<TcpChannel, FileStorage, SystemClock>;

#[derive(Parser)]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address of the game server, overrides the config file
    #[arg(short, long)]
    server: Option<String>,

    /// Directory for the saved session, overrides the config file
    #[arg(long)]
    session_dir: Option<PathBuf>,

    /// Minimum time between two displayed updates in milliseconds
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "warn")]
    log_level: LevelFilter,
}

impl Args {
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        if let Some(server) = &self.server {
            config.server = server.clone();
        }
        if let Some(session_dir) = &self.session_dir {
            config.session_dir = session_dir.clone();
        }
        if let Some(pacing_ms) = self.pacing_ms {
            config.pacing_interval_ms = pacing_ms;
        }
        Ok(config)
    }
}

enum LoopEvent {
    Transport(TransportEvent),
    Input(String),
    InputClosed,
}

impl From<TransportEvent> for LoopEvent {
    fn from(event: TransportEvent) -> Self {
        LoopEvent::Transport(event)
    }
}

fn spawn_stdin_reader(tx: Sender<LoopEvent>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(LoopEvent::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(LoopEvent::InputClosed);
    });
}

fn print_notices(controller: &mut Controller) {
    for notice in controller.take_notices() {
        let tag = match notice.level {
            Level::Success => "ok",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        println!("[{}] {}", tag, notice.message);
    }
}

fn print_games(controller: &Controller) {
    for game in controller.games().iter() {
        let visibility = match game.visibility {
            Some(Visibility::Private) => "private",
            _ => "public",
        };
        let seats = game
            .num_players
            .map(|num| format!("{}/{}", game.players.len(), num))
            .unwrap_or_else(|| game.players.len().to_string());
        println!(
            "{} ({}, {} players) {}",
            game.id,
            visibility,
            seats,
            game.players.join(", ")
        );
    }
}

fn print_state(controller: &Controller) {
    println!(
        "{} as {}",
        controller.game_id().unwrap_or("No game"),
        controller.player_name().unwrap_or("nobody")
    );
    let Some(snapshot) = controller.snapshot() else {
        return;
    };
    println!("{}", visualize_snapshot(snapshot));
    if let Some(player) = controller.player_name().and_then(|name| snapshot.player(name)) {
        let tiles: Vec<String> = player
            .collection
            .iter()
            .enumerate()
            .map(|(idx, tile)| format!("{}:{}", idx + 1, tile.short_name()))
            .collect();
        println!("Your tiles: {}", tiles.join(" "));
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    initialize_logging(args.log_level);

    let config = args.client_config()?;
    info!(server = %config.server, session_dir = %config.session_dir.display(), "Starting");

    let (tx, rx) = mpsc::channel::<LoopEvent>();
    spawn_stdin_reader(tx.clone());

    let mut controller: Controller = SyncController::new(
        TcpChannel::default(),
        FileStorage::new(&config.session_dir),
        SystemClock,
        &config,
    );
    let mut rng = StdRng::from_entropy();
    let mut connection_id = 0;
    let mut reconnect_at = Some(Instant::now());
    let mut shown_revision = 0;

    loop {
        if reconnect_at.is_some_and(|at| at <= Instant::now()) {
            reconnect_at = None;
            match connect(&config.server) {
                Ok(stream) => {
                    connection_id += 1;
                    let reader = stream.try_clone()?;
                    controller.channel_mut().attach(stream);
                    spawn_reader(reader, connection_id, tx.clone());
                    controller.on_connect();
                }
                Err(err) => {
                    warn!("{:#}", err);
                    match controller.next_retry(&mut rng) {
                        Some(delay) => reconnect_at = Some(Instant::now() + delay),
                        None => {
                            print_notices(&mut controller);
                            anyhow::bail!("Giving up on the server at '{}'", config.server);
                        }
                    }
                }
            }
        }

        controller.release_due();
        print_notices(&mut controller);
        if controller.revision() != shown_revision {
            shown_revision = controller.revision();
            if let Some(snapshot) = controller.snapshot() {
                println!("{}", visualize_snapshot(snapshot));
            }
        }

        let deadline = [controller.next_deadline(), reconnect_at]
            .into_iter()
            .flatten()
            .min();
        let event = match deadline {
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(event) => event,
                Err(_) => break,
            },
        };

        match event {
            LoopEvent::Transport(TransportEvent::Frame { connection, event })
                if connection == connection_id =>
            {
                let is_game_list = matches!(event, ServerEvent::ListGames(_));
                controller.handle_event(event);
                if is_game_list {
                    print_games(&controller);
                }
            }
            LoopEvent::Transport(TransportEvent::Closed { connection, reason })
                if connection == connection_id =>
            {
                controller.channel_mut().detach();
                match controller.on_disconnect(&reason) {
                    ReconnectAction::ReopenNow => reconnect_at = Some(Instant::now()),
                    ReconnectAction::Automatic => {
                        reconnect_at = controller
                            .next_retry(&mut rng)
                            .map(|delay| Instant::now() + delay);
                    }
                }
            }
            LoopEvent::Transport(stale) => debug!(?stale, "Ignoring event of an old connection"),
            LoopEvent::Input(line) => match line.trim() {
                "" => {}
                "quit" => break,
                "state" => print_state(&controller),
                line => match line.parse::<Intent>() {
                    Ok(intent) => controller.perform(intent),
                    Err(err) => println!("[warning] {}", err),
                },
            },
            LoopEvent::InputClosed => break,
        }
    }

    print_notices(&mut controller);
    controller.channel_mut().detach();
    Ok(())
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
