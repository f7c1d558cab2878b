//! Ordered, size-bounded delivery of narration to one channel.
//!
//! Narration is produced as lines. [`batch`] packs them into as few platform
//! messages as the length limit allows, word-wrapping any line that is too
//! long on its own; [`OutputSink`] then sends the batches strictly in order.

use std::sync::Arc;

use arena_engine::UserId;

use crate::chat::{ChannelId, ChatClient, MessageRef, MessageStyle};
use crate::error::{BatchError, DeliveryError};

#[derive(Clone)]
pub struct OutputSink {
    client: Arc<dyn ChatClient>,
    channel: ChannelId,
    max_len: usize,
}

impl OutputSink {
    pub fn new(client: Arc<dyn ChatClient>, channel: ChannelId, max_len: usize) -> Self {
        Self {
            client,
            channel,
            max_len: max_len.max(1),
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Send narration lines as quoted messages.
    ///
    /// A failed part does not stop later parts; failures are collected and
    /// returned once every batch has been attempted.
    pub async fn send<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<MessageRef>, BatchError> {
        self.deliver(batch(lines, self.max_len), MessageStyle::Quoted)
            .await
    }

    /// Send a visually distinguished message. Returns the last part, which is
    /// the one entrants see at the bottom of the channel.
    pub async fn send_announcement(&self, text: &str) -> Result<MessageRef, BatchError> {
        let sent = self
            .deliver(batch(&[text], self.max_len), MessageStyle::Announcement)
            .await?;
        sent.last().copied().ok_or(BatchError {
            attempted: 0,
            failures: Vec::new(),
        })
    }

    pub async fn edit(&self, message: MessageRef, text: &str) -> Result<(), DeliveryError> {
        let text: String = text.chars().take(self.max_len).collect();
        self.client.edit(message, &text).await
    }

    pub async fn react(&self, message: MessageRef, reaction: &str) -> Result<(), DeliveryError> {
        self.client.react(message, reaction).await
    }

    pub async fn send_direct(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        self.client.send_direct(user, text).await
    }

    async fn deliver(
        &self,
        parts: Vec<String>,
        style: MessageStyle,
    ) -> Result<Vec<MessageRef>, BatchError> {
        let attempted = parts.len();
        let mut sent = Vec::with_capacity(attempted);
        let mut failures = Vec::new();

        for part in parts {
            tracing::trace!("Sending {} chars to channel {}", part.chars().count(), self.channel);
            match self.client.send(self.channel, &part, style).await {
                Ok(message) => sent.push(message),
                Err(e) => {
                    tracing::warn!("Send to channel {} failed: {}", self.channel, e);
                    failures.push(e);
                }
            }
        }

        if failures.is_empty() {
            Ok(sent)
        } else {
            Err(BatchError {
                attempted,
                failures,
            })
        }
    }
}

/// Pack `lines` into messages of at most `max_len` characters, joined by
/// newlines, preserving order. Lines longer than the limit are word-wrapped
/// into their own messages.
pub fn batch<S: AsRef<str>>(lines: &[S], max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut out = Vec::new();
    let mut current: Option<(String, usize)> = None;

    for line in lines {
        let line = line.as_ref();
        let len = line.chars().count();

        if len > max_len {
            if let Some((text, _)) = current.take() {
                out.push(text);
            }
            out.extend(wrap(line, max_len));
            continue;
        }

        current = match current.take() {
            None => Some((line.to_string(), len)),
            Some((mut text, used)) if used + 1 + len <= max_len => {
                text.push('\n');
                text.push_str(line);
                Some((text, used + 1 + len))
            }
            Some((text, _)) => {
                out.push(text);
                Some((line.to_string(), len))
            }
        };
    }

    if let Some((text, _)) = current {
        out.push(text);
    }
    out
}

/// Split one oversize line on whitespace. A single word longer than the
/// limit is cut at character boundaries.
fn wrap(line: &str, max_len: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut used = 0;

    for word in line.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_len {
            if used > 0 {
                out.push(std::mem::take(&mut current));
                used = 0;
            }
            let rest = word.split_off(max_len);
            out.push(word.into_iter().collect());
            word = rest;
        }

        let len = word.len();
        if len == 0 {
            continue;
        }
        if used > 0 && used + 1 + len > max_len {
            out.push(std::mem::take(&mut current));
            used = 0;
        }
        if used > 0 {
            current.push(' ');
            used += 1;
        }
        current.extend(word);
        used += len;
    }

    if used > 0 {
        out.push(current);
    }
    out
}
