//! Process-wide registry of events, one per channel.
//!
//! The registry is a plain `std::sync::Mutex<HashMap>`: every operation is a
//! brief lookup or swap and no lock is held across an `.await`. Starting an
//! event awaits the announcement, so the channel is first *reserved* under
//! the lock and the reservation is upgraded once the announcement is out.
//! A second start for the same channel sees the reservation and is refused.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use arena_engine::{ConfigError, ContentError, Participant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::chat::{ChannelId, ChatClient, MessageId};
use crate::config::Settings;
use crate::game::{EventConfig, Game, GameError};
use crate::sink::OutputSink;

pub const ALREADY_RUNNING: &str = "There is already an active Hunger Games running in this channel, \
please wait for it to finish or stop the existing game first.";
pub const STARTING: &str = "Starting a Hunger Games event in this channel.";
pub const UNEXPECTED: &str = "There was an unexpected error starting the game.";

#[derive(Debug, Error)]
pub enum StartError {
    #[error("events can only be started from a channel")]
    ChannelUnavailable,

    #[error("an event is already running in channel {channel}")]
    AlreadyRunning { channel: ChannelId },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("event content unavailable: {0}")]
    Content(#[from] ContentError),

    #[error("event could not be started")]
    Announcement(#[source] GameError),
}

enum Slot {
    /// Reserved while the announcement is in flight.
    Starting { id: Uuid, cancel: CancellationToken },
    Active { game: Arc<Game>, cancel: CancellationToken },
}

impl Slot {
    fn is_live(&self) -> bool {
        match self {
            Slot::Starting { .. } => true,
            Slot::Active { game, .. } => game.is_running(),
        }
    }

    fn cancel(&self) {
        match self {
            Slot::Starting { cancel, .. } | Slot::Active { cancel, .. } => cancel.cancel(),
        }
    }
}

fn reserved_by(slot: Option<&Slot>, id: Uuid) -> bool {
    matches!(slot, Some(Slot::Starting { id: reserved, .. }) if *reserved == id)
}

pub struct EventManager {
    client: Arc<dyn ChatClient>,
    settings: Arc<Settings>,
    events: Mutex<HashMap<ChannelId, Slot>>,
}

impl EventManager {
    pub fn new(client: Arc<dyn ChatClient>, settings: Arc<Settings>) -> Self {
        Self {
            client,
            settings,
            events: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn sink(&self, channel: ChannelId) -> OutputSink {
        OutputSink::new(
            Arc::clone(&self.client),
            channel,
            self.settings.max_message_len,
        )
    }

    pub async fn start_event(&self, cfg: EventConfig) -> Result<Arc<Game>, StartError> {
        let channel = cfg.channel.ok_or(StartError::ChannelUnavailable)?;
        let sink = self.sink(channel);

        let game = Arc::new(Game::new(cfg, channel, sink.clone(), Arc::clone(&self.settings))?);
        let id = game.id();
        let cancel = CancellationToken::new();

        let conflict = {
            let mut events = self.lock();
            let live = events.get(&channel).map(Slot::is_live);
            if live == Some(true) {
                true
            } else {
                if let Some(stale) = events.remove(&channel) {
                    tracing::debug!("Discarding finished event in channel {}", channel);
                    stale.cancel();
                }
                events.insert(
                    channel,
                    Slot::Starting {
                        id,
                        cancel: cancel.clone(),
                    },
                );
                false
            }
        };

        if conflict {
            tracing::info!("Refusing second event in channel {}", channel);
            if let Err(e) = sink.send(&[ALREADY_RUNNING]).await {
                tracing::warn!("Could not report conflict in channel {}: {}", channel, e);
            }
            return Err(StartError::AlreadyRunning { channel });
        }

        tracing::info!("Starting event {} in channel {} ({})", id, channel, game.channel_name());
        if let Err(e) = sink.send(&[STARTING]).await {
            tracing::warn!("Could not acknowledge start in channel {}: {}", channel, e);
        }

        if let Err(e) = game.start(cancel.clone()).await {
            tracing::error!("Event {} failed to start: {}", id, e);
            cancel.cancel();
            self.release(channel, id);
            if let Err(e) = sink.send(&[UNEXPECTED]).await {
                tracing::warn!("Could not report start failure in channel {}: {}", channel, e);
            }
            return Err(StartError::Announcement(e));
        }

        let mut events = self.lock();
        if reserved_by(events.get(&channel), id) {
            events.insert(
                channel,
                Slot::Active {
                    game: Arc::clone(&game),
                    cancel,
                },
            );
        } else {
            // Cancelled while the announcement was in flight.
            tracing::info!("Event {} was cancelled during start", id);
            cancel.cancel();
        }
        drop(events);

        Ok(game)
    }

    /// Idempotent. Returns whether an entry was removed.
    pub fn cancel_event(&self, channel: ChannelId) -> bool {
        let removed = self.lock().remove(&channel);
        match removed {
            Some(slot) => {
                slot.cancel();
                tracing::info!("Cancelled event in channel {}", channel);
                true
            }
            None => false,
        }
    }

    pub fn can_start(&self, channel: ChannelId) -> bool {
        self.lock().get(&channel).is_none_or(|slot| !slot.is_live())
    }

    pub fn game(&self, channel: ChannelId) -> Option<Arc<Game>> {
        match self.lock().get(&channel) {
            Some(Slot::Active { game, .. }) => Some(Arc::clone(game)),
            _ => None,
        }
    }

    /// Route a reaction to the channel's event. Ignored when there is none.
    pub fn handle_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        reaction: &str,
        participant: Participant,
    ) {
        match self.game(channel) {
            Some(game) => game.register_participant(message, reaction, participant),
            None => tracing::trace!("Reaction in channel {} without an event", channel),
        }
    }

    fn release(&self, channel: ChannelId, id: Uuid) {
        let mut events = self.lock();
        if reserved_by(events.get(&channel), id) {
            events.remove(&channel);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChannelId, Slot>> {
        self.events.lock().expect("event registry poisoned")
    }
}
