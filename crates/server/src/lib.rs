//! Chat-channel host for the elimination simulation: events, pacing,
//! cancellation and delivery.

pub mod chat;
pub mod command;
pub mod config;
pub mod data;
pub mod error;
pub mod game;
pub mod manager;
pub mod narrator;
pub mod sink;

pub use chat::{ChannelId, ChatClient, MessageId, MessageRef};
pub use command::{Commands, StartOptions, StartRequest};
pub use config::Settings;
pub use game::{EventConfig, EventState, Game};
pub use manager::{EventManager, StartError};
