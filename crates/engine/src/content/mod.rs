//! Non-repeating narration content: elimination phrases and filler jokes.
//!
//! Both banks draw through a [`pool::ShuffledPool`], so within any window of
//! `len` consecutive draws no item repeats.

pub mod jokes;
pub mod phrases;
pub mod pool;
pub mod template;

use thiserror::Error;

use crate::random::RandomError;

pub use jokes::{Joke, JokeBank};
pub use phrases::PhraseBank;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("no {0} content supplied")]
    NoContent(&'static str),

    #[error("template {index} is invalid: {reason}")]
    Template { index: usize, reason: String },

    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Random(#[from] RandomError),
}
