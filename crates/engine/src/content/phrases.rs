//! Elimination phrase bank.

use super::pool::ShuffledPool;
use super::template::PhraseTemplate;
use super::ContentError;
use crate::random::RandomSource;

/// Non-repeating picker over parsed elimination templates.
pub struct PhraseBank {
    templates: Vec<PhraseTemplate>,
    pool: ShuffledPool,
    rng: Box<dyn RandomSource>,
}

impl PhraseBank {
    /// Build from raw template strings. Fails on an empty collection or on
    /// the first template that does not parse.
    pub fn new<S: AsRef<str>>(
        phrases: &[S],
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, ContentError> {
        if phrases.is_empty() {
            return Err(ContentError::NoContent("phrase"));
        }

        let templates = phrases
            .iter()
            .enumerate()
            .map(|(index, p)| {
                PhraseTemplate::parse(p.as_ref())
                    .map_err(|reason| ContentError::Template { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Phrase bank ready with {} templates", templates.len());
        Ok(Self {
            pool: ShuffledPool::new(templates.len()),
            templates,
            rng,
        })
    }

    /// Build from a JSON array of template strings.
    pub fn from_json(json: &str, rng: Box<dyn RandomSource>) -> Result<Self, ContentError> {
        let phrases: Vec<String> = serde_json::from_str(json).map_err(|source| {
            ContentError::Payload {
                kind: "phrase",
                source,
            }
        })?;
        Self::new(&phrases, rng)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Render the next phrase for `dying`, credited to `killer`.
    pub fn next(&mut self, killer: &str, dying: &str) -> Result<String, ContentError> {
        let index = self.pool.draw(&mut *self.rng)?;
        Ok(self.templates[index].render(killer, dying))
    }
}
