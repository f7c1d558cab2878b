use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use arena_engine::{Participant, UserId};
use clap::Parser;

use arena_server::chat::ConsoleChat;
use arena_server::command::{Commands, StartOptions, StartRequest};
use arena_server::config::Settings;
use arena_server::data;
use arena_server::{ChannelId, EventManager};

const CHANNEL: ChannelId = ChannelId(1);

/// Run one elimination event against the console.
#[derive(Parser, Debug)]
#[command(name = "arena-server")]
#[command(about = "Turn-based elimination events narrated in a chat channel")]
struct Args {
    /// JSON settings file. Missing fields keep their defaults.
    #[arg(long, env = "ARENA_SETTINGS")]
    settings: Option<PathBuf>,

    /// Elimination phrases (JSON array of templates).
    #[arg(long, env = "ARENA_PHRASES")]
    phrases: Option<PathBuf>,

    /// Narrator jokes (JSON array of {"q", "a"} objects).
    #[arg(long, env = "ARENA_JOKES")]
    jokes: Option<PathBuf>,

    /// Synthetic entrants to enroll.
    #[arg(long, env = "ARENA_ENTRANTS", default_value_t = 24)]
    entrants: u64,

    /// Enrollment delay in seconds.
    #[arg(long, env = "ARENA_DELAY", default_value_t = 5, allow_negative_numbers = true)]
    delay: i64,

    #[arg(long, env = "ARENA_VICTORS", allow_negative_numbers = true)]
    victors: Option<i64>,

    /// Entries per tribute.
    #[arg(long, env = "ARENA_CLONE", allow_negative_numbers = true)]
    clone: Option<i64>,

    #[arg(long, env = "ARENA_SPONSOR")]
    sponsor: Option<String>,

    /// Pause between days, overriding the settings file.
    #[arg(long, env = "ARENA_DAY_DELAY_MS")]
    day_delay_ms: Option<u64>,

    /// Seed for reproducible runs.
    #[arg(long, env = "ARENA_SEED")]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    let mut settings = match &args.settings {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading settings {}", path.display()))?;
            Settings::from_json(&raw).with_context(|| format!("parsing settings {}", path.display()))?
        }
        None => Settings::default(),
    };
    if let Some(ms) = args.day_delay_ms {
        settings.day_delay_ms = ms;
    }
    let settings = Arc::new(settings);

    let phrases = load_or(args.phrases.as_ref(), data::PHRASES_JSON)?;
    let jokes = load_or(args.jokes.as_ref(), data::JOKES_JSON)?;

    tracing::info!("Arena console host");

    let chat = Arc::new(ConsoleChat::new());
    let manager = Arc::new(EventManager::new(chat, Arc::clone(&settings)));
    let commands = Commands::new(Arc::clone(&manager), phrases, Some(jokes), args.seed);

    let host = Participant::new(UserId(0), "gamemaker").with_nickname("Effie");
    let request = StartRequest {
        channel: Some(CHANNEL),
        channel_name: "console".into(),
        started_by: host,
        options: StartOptions {
            delay_secs: Some(args.delay),
            victors: args.victors,
            clone: args.clone,
            sponsor: args.sponsor,
            notify: None,
            minimum_tier: None,
        },
    };

    let Some(game) = commands.start(request).await.context("starting event")? else {
        return Ok(());
    };
    let token = game
        .announcement()
        .context("event started without an announcement")?
        .id;

    let reaction = settings.emojis.participant.name.clone();
    for n in 1..=args.entrants {
        let tribute = Participant::new(UserId(n), format!("tribute{}", n));
        manager.handle_reaction(CHANNEL, token, &reaction, tribute);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tracing::info!("{} entrants enrolled", game.entrant_count());

    tokio::select! {
        state = game.wait_terminal() => {
            tracing::info!("Event {} ended: {}", game.id(), state);
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, cancelling event...");
            commands.cancel(CHANNEL).await;
            game.wait_terminal().await;
        }
    }

    manager.cancel_event(CHANNEL);
    Ok(())
}

fn load_or(path: Option<&PathBuf>, bundled: &str) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => Ok(bundled.to_string()),
    }
}
