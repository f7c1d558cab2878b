//! Recording client for tests and dry runs.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use arena_engine::UserId;
use async_trait::async_trait;

use super::{ChannelId, ChatClient, MessageId, MessageRef, MessageStyle};
use crate::error::DeliveryError;

/// Every outbound call, in the order it was made.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    Message {
        message: MessageRef,
        style: MessageStyle,
        text: String,
    },
    Edit {
        message: MessageRef,
        text: String,
    },
    Reaction {
        message: MessageRef,
        reaction: String,
    },
    Direct {
        user: UserId,
        text: String,
    },
}

#[derive(Default)]
struct Faults {
    /// Fail this many upcoming channel sends.
    sends: usize,
    edits: bool,
    directs: HashSet<UserId>,
}

/// Records instead of delivering. Failures can be scripted per capability;
/// failed calls are not recorded.
#[derive(Default)]
pub struct MemoryChat {
    log: Mutex<Vec<Outbound>>,
    next_id: AtomicU64,
    faults: Mutex<Faults>,
}

impl MemoryChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_sends(&self, count: usize) {
        self.faults.lock().expect("faults poisoned").sends = count;
    }

    pub fn fail_edits(&self, fail: bool) {
        self.faults.lock().expect("faults poisoned").edits = fail;
    }

    pub fn fail_direct_to(&self, user: UserId) {
        self.faults
            .lock()
            .expect("faults poisoned")
            .directs
            .insert(user);
    }

    pub fn outbound(&self) -> Vec<Outbound> {
        self.log.lock().expect("chat log poisoned").clone()
    }

    /// Text of every channel message, in order.
    pub fn messages(&self) -> Vec<String> {
        self.outbound()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Message { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn directs(&self) -> Vec<(UserId, String)> {
        self.outbound()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Direct { user, text } => Some((user, text)),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<(MessageRef, String)> {
        self.outbound()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Edit { message, text } => Some((message, text)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, entry: Outbound) {
        self.log.lock().expect("chat log poisoned").push(entry);
    }
}

#[async_trait]
impl ChatClient for MemoryChat {
    async fn send(
        &self,
        channel: ChannelId,
        text: &str,
        style: MessageStyle,
    ) -> Result<MessageRef, DeliveryError> {
        {
            let mut faults = self.faults.lock().expect("faults poisoned");
            if faults.sends > 0 {
                faults.sends -= 1;
                return Err(DeliveryError::Rejected {
                    channel,
                    reason: "scripted failure".into(),
                });
            }
        }

        let message = MessageRef {
            channel,
            id: MessageId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1),
        };
        self.record(Outbound::Message {
            message,
            style,
            text: text.to_string(),
        });
        Ok(message)
    }

    async fn edit(&self, message: MessageRef, text: &str) -> Result<(), DeliveryError> {
        if self.faults.lock().expect("faults poisoned").edits {
            return Err(DeliveryError::UnknownMessage(message.id));
        }
        self.record(Outbound::Edit {
            message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn react(&self, message: MessageRef, reaction: &str) -> Result<(), DeliveryError> {
        self.record(Outbound::Reaction {
            message,
            reaction: reaction.to_string(),
        });
        Ok(())
    }

    async fn send_direct(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        if self
            .faults
            .lock()
            .expect("faults poisoned")
            .directs
            .contains(&user)
        {
            return Err(DeliveryError::Direct {
                user,
                reason: "recipient does not accept direct messages".into(),
            });
        }
        self.record(Outbound::Direct {
            user,
            text: text.to_string(),
        });
        Ok(())
    }
}
