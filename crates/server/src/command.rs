//! Turns raw start/cancel requests into manager calls.
//!
//! Options arrive unvalidated from whatever command surface the host has.
//! Out-of-range values are corrected with a warning the user sees instead of
//! being rejected, except a victor count of zero, which stops the event.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use arena_engine::{JokeBank, OsRandom, Participant, PhraseBank, RandomSource, SeededRandom, UserId};
use regex::Regex;

use crate::chat::ChannelId;
use crate::config::{Bounds, Settings};
use crate::game::{EventConfig, Game};
use crate::manager::{EventManager, StartError};

pub const NO_VICTORS: &str = "There will be no victors this year. An uprising broke out in the \
underground sector, but rest easy knowing that the dissidents of the uprising will be eliminated.";
pub const UPRISING: &str =
    "District uprising ended the games early. The dissidents of the uprising will be eliminated.";

static SPONSOR_FORBIDDEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\-_.\[\] ]+").expect("invalid sponsor pattern"));

/// Raw start options. `None` means "use the default".
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub delay_secs: Option<i64>,
    pub victors: Option<i64>,
    pub clone: Option<i64>,
    pub sponsor: Option<String>,
    pub notify: Option<UserId>,
    pub minimum_tier: Option<u32>,
}

/// Validated start options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartPlan {
    pub delay: Duration,
    pub victors: usize,
    pub clone: usize,
    pub sponsor: String,
    pub notify: Option<UserId>,
    pub minimum_tier: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Start(StartPlan),
    /// Zero victors: nothing to run.
    NoVictors,
}

/// Keep letters, digits and `-_.[] `.
pub fn sanitize_sponsor(raw: &str) -> String {
    SPONSOR_FORBIDDEN.replace_all(raw, "").trim().to_string()
}

/// Resolve `opts` against `settings`. The returned warnings are meant for
/// the channel.
pub fn resolve(
    opts: &StartOptions,
    settings: &Settings,
    started_by: &Participant,
) -> (Resolution, Vec<String>) {
    let mut warnings = Vec::new();

    let delay = match opts.delay_secs {
        None => settings.start_delay.default,
        Some(v) => out_of_bounds(v, settings.start_delay).map_or(v, |too| {
            warnings.push(format!(
                "The delay of {} is much too {}. Hunger Games will wait for {} seconds instead.",
                v, too, settings.start_delay.default
            ));
            settings.start_delay.default
        }),
    };

    let clone = match opts.clone {
        None => settings.clone.default,
        Some(v) => match out_of_bounds(v, settings.clone) {
            None => v,
            Some(too) => {
                let fixed = if v < settings.clone.min {
                    settings.clone.min
                } else {
                    settings.clone.max
                };
                let word = if too == "short" { "low" } else { "high" };
                warnings.push(format!(
                    "The multiplier of {} is much too {}. Setting to {} instead.",
                    v, word, fixed
                ));
                fixed
            }
        },
    };

    let victors = match opts.victors {
        None => settings.default_victor_count,
        Some(0) => return (Resolution::NoVictors, warnings),
        Some(v) if v < 0 => {
            warnings.push(format!(
                "Victors of {} is much too low. Setting to {} instead.",
                v, settings.default_victor_count
            ));
            settings.default_victor_count
        }
        Some(v) => usize::try_from(v).unwrap_or(usize::MAX),
    };

    let sponsor = opts
        .sponsor
        .as_deref()
        .map(sanitize_sponsor)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| started_by.display_name().to_string());

    let plan = StartPlan {
        delay: Duration::from_secs(u64::try_from(delay).unwrap_or(0)),
        victors,
        clone: usize::try_from(clone).unwrap_or(1).max(1),
        sponsor,
        notify: opts.notify,
        minimum_tier: opts.minimum_tier,
    };
    (Resolution::Start(plan), warnings)
}

fn out_of_bounds(v: i64, bounds: Bounds) -> Option<&'static str> {
    if v < bounds.min {
        Some("short")
    } else if v > bounds.max {
        Some("long")
    } else {
        None
    }
}

/// A start request as delivered by the host's command surface.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub channel: Option<ChannelId>,
    pub channel_name: String,
    pub started_by: Participant,
    pub options: StartOptions,
}

/// Builds per-event content and forwards to the [`EventManager`].
pub struct Commands {
    manager: Arc<EventManager>,
    phrases_json: String,
    jokes_json: Option<String>,
    /// Deterministic runs when set; otherwise the OS entropy source.
    seed: Option<u64>,
    events_started: AtomicU64,
}

impl Commands {
    pub fn new(
        manager: Arc<EventManager>,
        phrases_json: String,
        jokes_json: Option<String>,
        seed: Option<u64>,
    ) -> Self {
        Self {
            manager,
            phrases_json,
            jokes_json,
            seed,
            events_started: AtomicU64::new(0),
        }
    }

    pub fn manager(&self) -> &Arc<EventManager> {
        &self.manager
    }

    /// `Ok(None)` when the options asked for no victors.
    pub async fn start(&self, req: StartRequest) -> Result<Option<Arc<Game>>, StartError> {
        let Some(channel) = req.channel else {
            tracing::info!("{} tried to start an event outside a channel", req.started_by.full_name());
            return Err(StartError::ChannelUnavailable);
        };
        let sink = self.manager.sink(channel);

        let (resolution, warnings) = resolve(&req.options, self.manager.settings(), &req.started_by);
        if !warnings.is_empty() {
            if let Err(e) = sink.send(&warnings).await {
                tracing::warn!("Could not deliver option warnings: {}", e);
            }
        }

        let plan = match resolution {
            Resolution::Start(plan) => plan,
            Resolution::NoVictors => {
                tracing::info!("Start in channel {} refused: zero victors", channel);
                if let Err(e) = sink.send(&[NO_VICTORS]).await {
                    tracing::warn!("Could not deliver refusal: {}", e);
                }
                return Ok(None);
            }
        };

        let n = self.events_started.fetch_add(1, Ordering::Relaxed);
        let phrases = PhraseBank::from_json(&self.phrases_json, self.rng(n, 0))?;
        let jokes = match self.jokes_json.as_deref().map(|j| JokeBank::from_json(j, self.rng(n, 1))) {
            Some(Ok(jokes)) => Some(jokes),
            Some(Err(e)) => {
                tracing::warn!("Jokes unavailable, narrator disabled: {}", e);
                None
            }
            None => None,
        };

        let cfg = EventConfig {
            channel: Some(channel),
            channel_name: req.channel_name,
            enrollment_delay: plan.delay,
            day_delay: None,
            clone: plan.clone,
            victor_count: plan.victors,
            minimum_tier: plan.minimum_tier,
            sponsor: plan.sponsor,
            notify: plan.notify,
            started_by: req.started_by,
            phrases,
            jokes,
            rng: self.rng(n, 2),
        };

        self.manager.start_event(cfg).await.map(Some)
    }

    /// Stop the channel's event. Returns whether there was one.
    pub async fn cancel(&self, channel: ChannelId) -> bool {
        if !self.manager.cancel_event(channel) {
            return false;
        }
        if let Err(e) = self.manager.sink(channel).send(&[UPRISING]).await {
            tracing::warn!("Could not announce cancellation: {}", e);
        }
        true
    }

    fn rng(&self, event: u64, stream: u64) -> Box<dyn RandomSource> {
        match self.seed {
            Some(seed) => Box::new(SeededRandom::new(
                seed.wrapping_add(event.wrapping_mul(3)).wrapping_add(stream),
            )),
            None => Box::new(OsRandom),
        }
    }
}
