//! One elimination day: how many die, who dies, and the quiet-day rule.

use std::collections::BTreeSet;
use std::ops::Range;

use crate::random::{RandomError, RandomSource};
use crate::roster::Participant;

/// Half-open range the day's kill count is drawn from.
///
/// At most half the roster dies and never more than would undercut the
/// victor count. Day 0 with more than five tributes narrows the draw to the
/// upper half-to-three-quarters of that range: the opening day is a
/// slaughter. `+1` turns each inclusive bound into the exclusive end.
pub fn kill_window(n: usize, victors: usize, day: usize, must_kill: bool) -> Range<usize> {
    let headroom = n.saturating_sub(victors);
    let mut min = usize::from(must_kill);
    let mut max = (n / 2).min(headroom) + 1;

    if day == 0 && n > 5 {
        min = max / 2;
        max = (max * 3 / 4).min(headroom) + 1;
    }

    min..max
}

/// `count` distinct indices into a roster of `n`, drawn uniformly without
/// replacement by rejection. Returned in roster order.
pub fn select_victims(
    rng: &mut dyn RandomSource,
    n: usize,
    count: usize,
) -> Result<BTreeSet<usize>, RandomError> {
    debug_assert!(count <= n, "cannot pick {count} victims from {n}");
    let count = count.min(n);

    let mut dead = BTreeSet::new();
    while dead.len() < count {
        dead.insert(rng.int_in(0..n)?);
    }
    Ok(dead)
}

/// Tracks consecutive days on which nobody died.
#[derive(Debug, Clone)]
pub struct QuietDays {
    threshold: usize,
    streak: usize,
}

impl QuietDays {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            streak: 0,
        }
    }

    /// The next day must kill at least one tribute.
    pub fn must_kill(&self) -> bool {
        self.streak >= self.threshold
    }

    pub fn streak(&self) -> usize {
        self.streak
    }

    /// Record a finished day by its roster size before and after.
    pub fn record(&mut self, before: usize, after: usize) {
        if before == after {
            self.streak += 1;
        } else {
            self.streak = 0;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elimination {
    pub victim: Participant,
    /// `None` when no survivor was left to take the credit.
    pub killer: Option<String>,
    pub line: String,
}

/// Everything that happened on one day, ready for narration.
#[derive(Debug, Clone)]
pub struct DayOutcome {
    /// Zero-based day index.
    pub day: usize,
    pub kill_count: usize,
    /// The quiet-day rule forced at least one kill.
    pub forced: bool,
    pub eliminations: Vec<Elimination>,
    pub survivors: Vec<Participant>,
}

impl DayOutcome {
    /// One-based day number for narration.
    pub fn number(&self) -> usize {
        self.day + 1
    }

    pub fn is_quiet(&self) -> bool {
        self.eliminations.is_empty()
    }
}
