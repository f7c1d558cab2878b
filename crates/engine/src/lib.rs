//! Platform-agnostic core of the elimination simulation.
//!
//! Nothing in this crate knows about chat platforms, timers or tasks: it turns
//! a roster plus a source of randomness into narrated elimination days. The
//! server crate owns pacing, cancellation and delivery.

pub mod content;
pub mod day;
pub mod random;
pub mod roster;
pub mod simulation;

pub use content::{ContentError, Joke, JokeBank, PhraseBank};
pub use day::{DayOutcome, Elimination, QuietDays};
pub use random::{OsRandom, RandomError, RandomSource, SeededRandom};
pub use roster::{Entrants, Participant, UserId};
pub use simulation::{ConfigError, Simulation};
