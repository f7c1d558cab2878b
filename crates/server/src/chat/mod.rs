//! The chat-platform capabilities the engine needs, and two in-process
//! implementations of them.
//!
//! A real gateway implements [`ChatClient`] and feeds reactions to
//! [`crate::manager::EventManager::handle_reaction`]; nothing else in the
//! crate knows which platform it is talking to.

pub mod console;
pub mod memory;

use std::fmt;

use arena_engine::UserId;
use async_trait::async_trait;

use crate::error::DeliveryError;

pub use console::ConsoleChat;
pub use memory::{MemoryChat, Outbound};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A delivered channel message. Its id doubles as the enrollment token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel: ChannelId,
    pub id: MessageId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageStyle {
    /// Ordinary narration, rendered as a block quote.
    Quoted,
    /// Visually distinguished (an embed on platforms that have them).
    Announcement,
}

#[async_trait]
pub trait ChatClient: Send + Sync + 'static {
    async fn send(
        &self,
        channel: ChannelId,
        text: &str,
        style: MessageStyle,
    ) -> Result<MessageRef, DeliveryError>;

    async fn edit(&self, message: MessageRef, text: &str) -> Result<(), DeliveryError>;

    /// Attach a reaction so entrants have something to click.
    async fn react(&self, message: MessageRef, reaction: &str) -> Result<(), DeliveryError>;

    async fn send_direct(&self, user: UserId, text: &str) -> Result<(), DeliveryError>;
}
