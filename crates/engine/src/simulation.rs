//! Day-by-day elimination over a frozen roster.

use thiserror::Error;

use crate::content::PhraseBank;
use crate::day::{self, DayOutcome, Elimination, QuietDays};
use crate::random::{RandomError, RandomSource};
use crate::roster::Participant;

/// Credited when a victim dies with no survivor left to name.
pub const FALLBACK_KILLER: &str = "another player";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("victor count must be at least 1")]
    NoVictors,
}

/// Owns the randomness and phrase sources for one event and applies the
/// elimination-day algorithm to whatever roster it is handed.
pub struct Simulation {
    rng: Box<dyn RandomSource>,
    phrases: PhraseBank,
    victor_count: usize,
    mention_victims: bool,
    quiet: QuietDays,
}

impl Simulation {
    /// `quiet_threshold` consecutive quiet days force a kill on the next.
    /// `mention_victims` narrates victims by mention instead of bold name;
    /// it only makes sense when identities are not cloned.
    pub fn new(
        phrases: PhraseBank,
        rng: Box<dyn RandomSource>,
        victor_count: usize,
        quiet_threshold: usize,
        mention_victims: bool,
    ) -> Result<Self, ConfigError> {
        if victor_count == 0 {
            return Err(ConfigError::NoVictors);
        }
        Ok(Self {
            rng,
            phrases,
            victor_count,
            mention_victims,
            quiet: QuietDays::new(quiet_threshold),
        })
    }

    pub fn victor_count(&self) -> usize {
        self.victor_count
    }

    pub fn is_complete(&self, remaining: usize) -> bool {
        remaining <= self.victor_count
    }

    pub fn quiet_streak(&self) -> usize {
        self.quiet.streak()
    }

    /// Simulate day `day` over `roster`.
    ///
    /// A random failure aborts the whole day: nothing is returned, so the
    /// caller's roster stays at its last consistent state. Phrase failures
    /// only degrade the affected line.
    pub fn run_day(&mut self, day: usize, roster: &[Participant]) -> Result<DayOutcome, RandomError> {
        let n = roster.len();
        let forced = self.quiet.must_kill();

        if n <= 1 {
            return Ok(DayOutcome {
                day,
                kill_count: 0,
                forced,
                eliminations: Vec::new(),
                survivors: roster.to_vec(),
            });
        }

        if forced {
            tracing::debug!(
                "Forcing a kill on day {} after {} quiet days",
                day,
                self.quiet.streak()
            );
        }

        let window = day::kill_window(n, self.victor_count, day, forced);
        let kill_count = self.rng.int_in(window.clone())?;
        tracing::trace!("Day {}: kill window {:?}, drew {}", day, window, kill_count);

        let dead = day::select_victims(&mut *self.rng, n, kill_count)?;

        let survivors: Vec<Participant> = roster
            .iter()
            .enumerate()
            .filter(|(i, _)| !dead.contains(i))
            .map(|(_, p)| p.clone())
            .collect();

        let mut killers = Vec::with_capacity(dead.len());
        for _ in &dead {
            let killer = if survivors.is_empty() {
                None
            } else {
                let pick = self.rng.int_in(0..survivors.len())?;
                Some(survivors[pick].display_name().to_string())
            };
            killers.push(killer);
        }

        let eliminations = dead
            .iter()
            .zip(killers)
            .map(|(&i, killer)| {
                let victim = roster[i].clone();
                let line = self.narrate(&victim, killer.as_deref());
                Elimination {
                    victim,
                    killer,
                    line,
                }
            })
            .collect();

        self.quiet.record(n, survivors.len());

        Ok(DayOutcome {
            day,
            kill_count,
            forced,
            eliminations,
            survivors,
        })
    }

    /// Run days back to back until the victor count is reached.
    pub fn run_to_completion(
        &mut self,
        mut roster: Vec<Participant>,
    ) -> Result<(Vec<DayOutcome>, Vec<Participant>), RandomError> {
        let mut days = Vec::new();
        let mut day = 0;
        while !self.is_complete(roster.len()) {
            let outcome = self.run_day(day, &roster)?;
            roster = outcome.survivors.clone();
            days.push(outcome);
            day += 1;
        }
        Ok((days, roster))
    }

    fn narrate(&mut self, victim: &Participant, killer: Option<&str>) -> String {
        let dying = if self.mention_victims {
            victim.mention()
        } else {
            format!("**{}**", victim.display_name())
        };

        match self.phrases.next(killer.unwrap_or(FALLBACK_KILLER), &dying) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Falling back to generic phrase for {}: {}", victim.full_name(), e);
                format!("{} died of dysentery.", dying)
            }
        }
    }
}
