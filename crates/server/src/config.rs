//! Runtime settings: pacing, option bounds, platform limits and emoji.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration. The binary layers command-line/environment overrides
//! on top.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Longest message the platform accepts, in characters.
    pub max_message_len: usize,
    /// Pause between elimination days.
    pub day_delay_ms: u64,
    /// Consecutive quiet days tolerated before a kill is forced.
    pub max_quiet_days: usize,
    pub narrator: NarratorSettings,
    /// Enrollment delay, in seconds.
    pub start_delay: Bounds,
    pub clone: Bounds,
    pub default_victor_count: usize,
    pub emojis: Emojis,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_message_len: 2000,
            day_delay_ms: 5_000,
            max_quiet_days: 3,
            narrator: NarratorSettings::default(),
            start_delay: Bounds {
                default: 60,
                min: 5,
                max: 900,
            },
            clone: Bounds {
                default: 1,
                min: 1,
                max: 100,
            },
            default_victor_count: 1,
            emojis: Emojis::default(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn day_delay(&self) -> Duration {
        Duration::from_millis(self.day_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarratorSettings {
    pub warmup_ms: u64,
    pub interval_ms: u64,
    /// Consecutive failed ticks before the narrator gives up.
    pub max_failures: usize,
}

impl Default for NarratorSettings {
    fn default() -> Self {
        Self {
            warmup_ms: 2_000,
            interval_ms: 20_000,
            max_failures: 5,
        }
    }
}

impl NarratorSettings {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Bounds {
    pub default: i64,
    pub min: i64,
    pub max: i64,
}

/// A custom platform emoji, or a plain unicode one when `id` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Emoji {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

impl Emoji {
    pub fn unicode(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: None,
            animated: false,
        }
    }

    /// Inline form for message text.
    pub fn code(&self) -> String {
        match &self.id {
            Some(id) if self.animated => format!("<a:{}:{}>", self.name, id),
            Some(id) => format!("<:{}:{}>", self.name, id),
            None => self.name.clone(),
        }
    }

    /// Form used when attaching the emoji as a reaction.
    pub fn reaction(&self) -> String {
        match &self.id {
            Some(id) => format!("{}:{}", self.name, id),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Emojis {
    /// The entry reaction. Incoming reactions are matched on its name.
    pub participant: Emoji,
    pub clone: Emoji,
    pub host: Emoji,
    pub president: Emoji,
    pub escort: Emoji,
    pub day: Emoji,
}

impl Default for Emojis {
    fn default() -> Self {
        Self {
            participant: Emoji::unicode("🕊️"),
            clone: Emoji::unicode("👯"),
            host: Emoji::unicode("🎙️"),
            president: Emoji::unicode("🌹"),
            escort: Emoji::unicode("🎀"),
            day: Emoji::unicode("☀️"),
        }
    }
}
