//! Terminal rendering of the chat surface, used by the console host.

use std::sync::atomic::{AtomicU64, Ordering};

use arena_engine::UserId;
use async_trait::async_trait;

use super::{ChannelId, ChatClient, MessageId, MessageRef, MessageStyle};
use crate::error::DeliveryError;

const RULE: &str = "_,.-'~'-.,__,.-'~'-.,__,.-'~'-.,_";

#[derive(Default)]
pub struct ConsoleChat {
    next_id: AtomicU64,
}

impl ConsoleChat {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Prefix every line with `> ` the way a block quote renders.
fn quote(text: &str) -> String {
    text.lines()
        .map(|l| format!("> {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ChatClient for ConsoleChat {
    async fn send(
        &self,
        channel: ChannelId,
        text: &str,
        style: MessageStyle,
    ) -> Result<MessageRef, DeliveryError> {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        match style {
            MessageStyle::Quoted => println!("[#{channel} msg {id}]\n{}\n", quote(text)),
            MessageStyle::Announcement => {
                println!("[#{channel} msg {id}]\n{RULE}\n{text}\n{RULE}\n")
            }
        }
        Ok(MessageRef { channel, id })
    }

    async fn edit(&self, message: MessageRef, text: &str) -> Result<(), DeliveryError> {
        println!("[#{} msg {} edited]\n{}\n", message.channel, message.id, quote(text));
        Ok(())
    }

    async fn react(&self, message: MessageRef, reaction: &str) -> Result<(), DeliveryError> {
        println!("[#{} msg {}] +{}\n", message.channel, message.id, reaction);
        Ok(())
    }

    async fn send_direct(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        println!("[DM to {user}]\n{}\n", quote(text));
        Ok(())
    }
}
