//! Filler jokes told by the narrator while enrollment is open.

use serde::{Deserialize, Serialize};

use super::pool::ShuffledPool;
use super::ContentError;
use crate::random::RandomSource;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Joke {
    #[serde(rename = "q")]
    pub question: String,
    #[serde(rename = "a")]
    pub answer: String,
}

pub struct JokeBank {
    jokes: Vec<Joke>,
    pool: ShuffledPool,
    rng: Box<dyn RandomSource>,
}

impl JokeBank {
    pub fn new(jokes: Vec<Joke>, rng: Box<dyn RandomSource>) -> Result<Self, ContentError> {
        if jokes.is_empty() {
            return Err(ContentError::NoContent("joke"));
        }
        tracing::debug!("Joke bank ready with {} jokes", jokes.len());
        Ok(Self {
            pool: ShuffledPool::new(jokes.len()),
            jokes,
            rng,
        })
    }

    /// Build from a JSON array of `{"q": .., "a": ..}` objects.
    pub fn from_json(json: &str, rng: Box<dyn RandomSource>) -> Result<Self, ContentError> {
        let jokes: Vec<Joke> = serde_json::from_str(json)
            .map_err(|source| ContentError::Payload { kind: "joke", source })?;
        Self::new(jokes, rng)
    }

    pub fn len(&self) -> usize {
        self.jokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jokes.is_empty()
    }

    pub fn next(&mut self) -> Result<&Joke, ContentError> {
        let index = self.pool.draw(&mut *self.rng)?;
        Ok(&self.jokes[index])
    }
}
