//! Delivery failures on the chat surface.

use arena_engine::UserId;
use thiserror::Error;

use crate::chat::{ChannelId, MessageId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("platform rejected message to channel {channel}: {reason}")]
    Rejected { channel: ChannelId, reason: String },

    #[error("message {0} no longer exists")]
    UnknownMessage(MessageId),

    #[error("direct message to {user} failed: {reason}")]
    Direct { user: UserId, reason: String },
}

/// Aggregated failures of one multi-message send. Parts that did go out are
/// not retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{} of {} messages failed", .failures.len(), .attempted)]
pub struct BatchError {
    pub attempted: usize,
    pub failures: Vec<DeliveryError>,
}
