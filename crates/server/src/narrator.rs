//! Background banter while enrollment is open.
//!
//! The narrator runs on its own tokio task: after a short warm-up it posts a
//! joke, then on every tick edits that same message with the next joke. It
//! yields to two signals, whichever comes first: its own stop token (the
//! enrollment window closed) and the event's cancellation token.

use std::time::Duration;

use arena_engine::{ContentError, JokeBank};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::chat::MessageRef;
use crate::error::{BatchError, DeliveryError};
use crate::sink::OutputSink;

#[derive(Debug, Clone)]
pub struct NarratorConfig {
    pub warmup: Duration,
    pub interval: Duration,
    /// Consecutive failed ticks before the narrator stops itself.
    pub max_failures: usize,
    /// Printed above every joke.
    pub preamble: String,
}

#[derive(Debug, Error)]
enum TellError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Send(#[from] BatchError),
    #[error(transparent)]
    Edit(#[from] DeliveryError),
}

pub struct Narrator {
    jokes: JokeBank,
    sink: OutputSink,
    config: NarratorConfig,
}

impl Narrator {
    pub fn new(jokes: JokeBank, sink: OutputSink, config: NarratorConfig) -> Self {
        Self {
            jokes,
            sink,
            config,
        }
    }

    /// Runs in the caller's current span.
    pub fn spawn(self, stop: CancellationToken, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(stop, cancel).in_current_span())
    }

    async fn run(mut self, stop: CancellationToken, cancel: CancellationToken) {
        tokio::select! {
            _ = stop.cancelled() => return,
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(self.config.warmup) => {}
        }

        tracing::debug!("Narrator started in channel {}", self.sink.channel());

        let mut interval = tokio::time::interval(self.config.interval);
        // The first tick fires immediately; the warm-up already covered it.
        interval.tick().await;

        let mut last: Option<MessageRef> = None;
        let mut failures = 0;
        loop {
            match self.tell(last).await {
                Ok(message) => {
                    last = Some(message);
                    failures = 0;
                }
                Err(e) => {
                    failures += 1;
                    if failures >= self.config.max_failures {
                        tracing::error!(
                            "Narrator failed {} times in a row, giving up: {}",
                            failures,
                            e
                        );
                        return;
                    }
                    tracing::warn!("Narrator tick failed ({}), waiting for next tick", e);
                }
            }

            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
        }

        tracing::debug!("Narrator stopped in channel {}", self.sink.channel());
    }

    /// Post a new joke, or replace the previous one in place.
    async fn tell(&mut self, previous: Option<MessageRef>) -> Result<MessageRef, TellError> {
        let joke = self.jokes.next()?;
        let text = format!(
            "{}\n\n*{}*\n*{}*",
            self.config.preamble, joke.question, joke.answer
        );

        match previous {
            Some(message) => {
                self.sink.edit(message, &text).await?;
                Ok(message)
            }
            None => {
                let sent = self.sink.send(&[text]).await?;
                sent.last().copied().ok_or_else(|| {
                    TellError::Send(BatchError {
                        attempted: 0,
                        failures: Vec::new(),
                    })
                })
            }
        }
    }
}
