//! One event in one channel: enrollment, delayed start, the day loop and the
//! final notifications.
//!
//! A [`Game`] is shared behind an `Arc` between its own timer task, the
//! narrator and whoever delivers reactions. `state` and the enrollment roster
//! live under a single `std::sync::Mutex` that is only ever held for plain
//! field access, never across an `.await`. The flip to `Started` and the
//! registration check take that same lock, so a reaction racing the flip is
//! either counted or rejected, never lost halfway.

pub mod narration;
pub mod state;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use arena_engine::{ConfigError, Entrants, JokeBank, Participant, PhraseBank, RandomSource, Simulation, UserId};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::chat::{ChannelId, MessageId, MessageRef};
use crate::config::Settings;
use crate::error::BatchError;
use crate::narrator::{Narrator, NarratorConfig};
use crate::sink::OutputSink;

use narration::AnnouncementParams;
pub use state::EventState;

/// Everything needed to run one event, as assembled by the command layer.
pub struct EventConfig {
    /// `None` when the command was not issued from a channel.
    pub channel: Option<ChannelId>,
    pub channel_name: String,
    pub enrollment_delay: Duration,
    /// Falls back to the configured default.
    pub day_delay: Option<Duration>,
    pub clone: usize,
    pub victor_count: usize,
    /// Advisory; shown in the announcement only.
    pub minimum_tier: Option<u32>,
    pub sponsor: String,
    pub notify: Option<UserId>,
    pub started_by: Participant,
    pub phrases: PhraseBank,
    /// The narrator only runs when jokes are supplied.
    pub jokes: Option<JokeBank>,
    pub rng: Box<dyn RandomSource>,
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("enrollment announcement could not be delivered: {0}")]
    Announcement(#[source] BatchError),
}

/// Immutable per-event parameters.
struct Metadata {
    channel: ChannelId,
    channel_name: String,
    enrollment_delay: Duration,
    day_delay: Duration,
    clone: usize,
    minimum_tier: Option<u32>,
    sponsor: String,
    notify: Option<UserId>,
    started_by: Participant,
}

struct Inner {
    state: EventState,
    entrants: Entrants,
    /// The living roster once the event has started.
    tributes: Vec<Participant>,
    announcement: Option<MessageRef>,
}

pub struct Game {
    id: Uuid,
    meta: Metadata,
    settings: Arc<Settings>,
    sink: OutputSink,
    inner: Mutex<Inner>,
    /// Taken by the day loop when it starts.
    simulation: Mutex<Option<Simulation>>,
    /// Taken by the narrator when it starts.
    jokes: Mutex<Option<JokeBank>>,
    state_tx: watch::Sender<EventState>,
    span: tracing::Span,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Game {
    /// Fails when the configuration could never finish (no victors).
    pub fn new(
        cfg: EventConfig,
        channel: ChannelId,
        sink: OutputSink,
        settings: Arc<Settings>,
    ) -> Result<Self, ConfigError> {
        let simulation = Simulation::new(
            cfg.phrases,
            cfg.rng,
            cfg.victor_count,
            settings.max_quiet_days,
            cfg.clone <= 1,
        )?;

        let id = Uuid::new_v4();
        let span = tracing::info_span!("event", %id, %channel, name = %cfg.channel_name);
        let (state_tx, _) = watch::channel(EventState::NotStarted);

        Ok(Self {
            id,
            meta: Metadata {
                channel,
                channel_name: cfg.channel_name,
                enrollment_delay: cfg.enrollment_delay,
                day_delay: cfg.day_delay.unwrap_or_else(|| settings.day_delay()),
                clone: cfg.clone.max(1),
                minimum_tier: cfg.minimum_tier,
                sponsor: cfg.sponsor,
                notify: cfg.notify,
                started_by: cfg.started_by,
            },
            settings,
            sink,
            inner: Mutex::new(Inner {
                state: EventState::NotStarted,
                entrants: Entrants::new(),
                tributes: Vec::new(),
                announcement: None,
            }),
            simulation: Mutex::new(Some(simulation)),
            jokes: Mutex::new(cfg.jokes),
            state_tx,
            span,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn channel(&self) -> ChannelId {
        self.meta.channel
    }

    pub fn channel_name(&self) -> &str {
        &self.meta.channel_name
    }

    pub fn state(&self) -> EventState {
        self.lock().state
    }

    pub fn has_started(&self) -> bool {
        self.state() != EventState::NotStarted
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub fn entrant_count(&self) -> usize {
        self.lock().entrants.len()
    }

    /// The living roster. Empty until the event starts.
    pub fn survivors(&self) -> Vec<Participant> {
        self.lock().tributes.clone()
    }

    /// The enrollment announcement; its id is the registration token.
    pub fn announcement(&self) -> Option<MessageRef> {
        self.lock().announcement
    }

    pub fn subscribe(&self) -> watch::Receiver<EventState> {
        self.state_tx.subscribe()
    }

    /// Resolves once the event is finished or cancelled.
    pub async fn wait_terminal(&self) -> EventState {
        let mut rx = self.state_tx.subscribe();
        let state = match rx.wait_for(|s| s.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        state
    }

    /// Announce the event, seed the entry reaction, start the narrator and arm
    /// the delayed-start timer. Nothing is armed if the announcement fails.
    pub async fn start(self: &Arc<Self>, cancel: CancellationToken) -> Result<MessageRef, GameError> {
        let emojis = &self.settings.emojis;
        let text = narration::announcement(
            emojis,
            &AnnouncementParams {
                delay: self.meta.enrollment_delay,
                sponsor: &self.meta.sponsor,
                victors: self.victor_count(),
                clone: self.meta.clone,
                minimum_tier: self.meta.minimum_tier,
            },
        );

        let message = self
            .sink
            .send_announcement(&text)
            .instrument(self.span.clone())
            .await
            .map_err(GameError::Announcement)?;
        self.lock().announcement = Some(message);

        self.span.in_scope(|| {
            tracing::info!(
                "Enrollment open for {:?}, token {}",
                self.meta.enrollment_delay,
                message.id
            )
        });

        if let Err(e) = self.sink.react(message, &emojis.participant.reaction()).await {
            self.span.in_scope(|| tracing::warn!("Could not seed entry reaction: {}", e));
        }

        let stop = CancellationToken::new();
        let jokes = self.jokes.lock().expect("jokes lock poisoned").take();
        match jokes {
            Some(jokes) => {
                let config = NarratorConfig {
                    warmup: self.settings.narrator.warmup(),
                    interval: self.settings.narrator.interval(),
                    max_failures: self.settings.narrator.max_failures,
                    preamble: narration::narrator_preamble(emojis),
                };
                let narrator = Narrator::new(jokes, self.sink.clone(), config);
                self.span
                    .in_scope(|| narrator.spawn(stop.clone(), cancel.clone()));
            }
            None => self
                .span
                .in_scope(|| tracing::debug!("No jokes supplied, narrator not started")),
        }

        let game = Arc::clone(self);
        let span = self.span.clone();
        tokio::spawn(async move { game.delayed_start(stop, cancel).await }.instrument(span));

        Ok(message)
    }

    /// Enroll `participant` if the reaction is the entry reaction on the
    /// announcement and enrollment is still open. Anything else is ignored.
    pub fn register_participant(&self, token: MessageId, reaction: &str, participant: Participant) {
        let _enter = self.span.enter();
        let name = participant.full_name();
        let mut inner = self.lock();

        if inner.state != EventState::NotStarted {
            tracing::debug!("Event already started, not registering {}", name);
            return;
        }
        if reaction != self.settings.emojis.participant.name {
            tracing::debug!("{} reacted with {}, not registering", name, reaction);
            return;
        }
        if inner.announcement.map(|m| m.id) != Some(token) {
            tracing::debug!("{} reacted to a different message, not registering", name);
            return;
        }
        if participant.bot {
            tracing::debug!("{} is a bot, not registering", name);
            return;
        }

        if inner.entrants.insert(participant) {
            tracing::info!("Registered {}", name);
        } else {
            tracing::debug!("{} already registered", name);
        }
    }

    fn victor_count(&self) -> usize {
        self.simulation
            .lock()
            .expect("simulation lock poisoned")
            .as_ref()
            .map_or(self.settings.default_victor_count, Simulation::victor_count)
    }

    async fn delayed_start(self: Arc<Self>, stop: CancellationToken, cancel: CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {
                stop.cancel();
                tracing::info!("Event cancelled before it started");
                self.set_state(EventState::Cancelled);
                return;
            }
            _ = tokio::time::sleep(self.meta.enrollment_delay) => {}
        }

        stop.cancel();
        self.run(&cancel).await;
    }

    /// The day loop. Runs on the timer task until a terminal state.
    async fn run(&self, cancel: &CancellationToken) {
        let entrants = {
            let mut inner = self.lock();
            if inner.state != EventState::NotStarted {
                return;
            }
            if inner.entrants.is_empty() {
                self.transition(&mut inner, EventState::Cancelled);
                None
            } else {
                self.transition(&mut inner, EventState::Started);
                Some(inner.entrants.clone())
            }
        };

        let Some(entrants) = entrants else {
            tracing::info!("No entrants, cancelling");
            let text = narration::no_entrants(self.meta.enrollment_delay);
            if let Err(e) = self.sink.send(&[text]).await {
                tracing::warn!("Could not announce empty roster: {}", e);
            }
            return;
        };

        let simulation = self.simulation.lock().expect("simulation lock poisoned").take();
        let Some(mut simulation) = simulation else {
            tracing::error!("Simulation already consumed");
            self.set_state(EventState::Cancelled);
            return;
        };

        let mut roster = entrants.into_tributes(self.meta.clone);
        tracing::info!("Starting with {} tributes", roster.len());
        self.lock().tributes = roster.clone();

        let emojis = &self.settings.emojis;
        if let Err(e) = self.sink.send(&narration::roster(emojis, &roster, self.meta.clone)).await {
            tracing::warn!("Roster announcement incomplete: {}", e);
        }

        let mut day = 0;
        while !simulation.is_complete(roster.len()) {
            if cancel.is_cancelled() {
                self.cancelled(day);
                return;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.cancelled(day);
                    return;
                }
                _ = tokio::time::sleep(self.meta.day_delay) => {}
            }

            let outcome = match simulation.run_day(day, &roster) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Day {} aborted: {}", day + 1, e);
                    if let Err(e) = self.sink.send(&[narration::day_failed(day + 1)]).await {
                        tracing::warn!("Could not report failed day: {}", e);
                    }
                    self.set_state(EventState::Cancelled);
                    return;
                }
            };

            if cancel.is_cancelled() {
                self.cancelled(day);
                return;
            }

            for elimination in &outcome.eliminations {
                tracing::trace!("Day {}: {}", outcome.number(), elimination.line);
            }
            tracing::debug!(
                "Day {} killed {}{}, {} remain",
                outcome.number(),
                outcome.kill_count,
                if outcome.forced { " (forced)" } else { "" },
                outcome.survivors.len()
            );

            if let Err(e) = self.sink.send(&narration::day(emojis, &outcome)).await {
                tracing::warn!("Day {} narration incomplete: {}", outcome.number(), e);
            }

            roster = outcome.survivors;
            self.lock().tributes = roster.clone();
            day += 1;
        }

        if cancel.is_cancelled() {
            self.cancelled(day);
            return;
        }
        self.finish(&roster, cancel, day).await;
    }

    async fn finish(&self, victors: &[Participant], cancel: &CancellationToken, day: usize) {
        let names: Vec<String> = victors.iter().map(Participant::full_name).collect();
        tracing::info!("Winners for sponsor {}: {}", self.meta.sponsor, names.join(", "));

        let lines = narration::finale(
            &self.settings.emojis,
            victors,
            &self.meta.sponsor,
            self.meta.notify,
            self.meta.clone <= 1,
        );
        if let Err(e) = self.sink.send(&lines).await {
            tracing::warn!("Final announcement incomplete: {}", e);
        }

        // Cancelled while the finale was in flight: no result, no notifications.
        if cancel.is_cancelled() {
            self.cancelled(day);
            return;
        }
        self.set_state(EventState::Finished);
        self.notify_results(victors).await;
    }

    /// Private notifications. Each recipient is independent.
    async fn notify_results(&self, victors: &[Participant]) {
        let started_by = &self.meta.started_by;
        if let Err(e) = self
            .sink
            .send_direct(started_by.id, &narration::initiator_summary(victors))
            .await
        {
            tracing::error!("Could not notify initiator {}: {}", started_by.full_name(), e);
        }

        let text = narration::victor_congratulations(started_by);
        let mut seen = HashSet::new();
        for victor in victors {
            if !seen.insert(victor.id) {
                continue;
            }
            if let Err(e) = self.sink.send_direct(victor.id, &text).await {
                tracing::error!("Could not notify victor {}: {}", victor.full_name(), e);
            }
        }
    }

    fn cancelled(&self, day: usize) {
        tracing::info!("Event cancelled during day {}", day + 1);
        self.set_state(EventState::Cancelled);
    }

    fn set_state(&self, next: EventState) {
        let mut inner = self.lock();
        self.transition(&mut inner, next);
    }

    /// Terminal states are final.
    fn transition(&self, inner: &mut Inner, next: EventState) {
        if inner.state.is_terminal() || inner.state == next {
            return;
        }
        tracing::debug!("State {} -> {}", inner.state, next);
        inner.state = next;
        self.state_tx.send_replace(next);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("event state lock poisoned")
    }
}
