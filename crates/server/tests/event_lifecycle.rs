//! Event lifecycle against the in-memory chat client: enrollment, the day
//! loop, cancellation, single-flight per channel and delivery failures.
//!
//! Every test runs on a paused clock, so enrollment windows and day delays
//! elapse instantly once all tasks are idle.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use arena_engine::{
    ConfigError, Joke, JokeBank, Participant, PhraseBank, RandomError, RandomSource, SeededRandom,
    UserId,
};
use arena_server::ChatClient;
use arena_server::chat::{ChannelId, MemoryChat, MessageId, MessageRef, MessageStyle, Outbound};
use arena_server::error::DeliveryError;
use async_trait::async_trait;
use tokio::sync::Notify;
use arena_server::command::{self, Commands, StartOptions, StartRequest};
use arena_server::config::Settings;
use arena_server::data;
use arena_server::game::{EventConfig, EventState};
use arena_server::manager::{self, EventManager, StartError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const CHANNEL: ChannelId = ChannelId(42);
const HOST: UserId = UserId(1_000);

fn setup() -> (Arc<MemoryChat>, Arc<EventManager>) {
    let chat = Arc::new(MemoryChat::new());
    let manager = Arc::new(EventManager::new(chat.clone(), Arc::new(Settings::default())));
    (chat, manager)
}

fn config(seed: u64, victors: usize) -> EventConfig {
    EventConfig {
        channel: Some(CHANNEL),
        channel_name: "arena".into(),
        enrollment_delay: Duration::from_secs(10),
        day_delay: Some(Duration::from_secs(1)),
        clone: 1,
        victor_count: victors,
        minimum_tier: None,
        sponsor: "Acme".into(),
        notify: None,
        started_by: Participant::new(HOST, "host"),
        phrases: PhraseBank::from_json(data::PHRASES_JSON, Box::new(SeededRandom::new(seed)))
            .unwrap(),
        jokes: None,
        rng: Box::new(SeededRandom::new(seed + 1)),
    }
}

fn entry() -> String {
    Settings::default().emojis.participant.name
}

fn enroll(manager: &EventManager, token: MessageId, count: u64) {
    for id in 1..=count {
        manager.handle_reaction(
            CHANNEL,
            token,
            &entry(),
            Participant::new(UserId(id), format!("tribute{id}")),
        );
    }
}

/// Let spawned tasks drain whatever they do after the last state change.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn full_run_ends_with_exactly_the_victors() {
    let (chat, manager) = setup();
    let game = manager.start_event(config(7, 2)).await.unwrap();
    enroll(&manager, game.announcement().unwrap().id, 10);
    assert_eq!(game.entrant_count(), 10);

    assert_eq!(game.wait_terminal().await, EventState::Finished);
    settle().await;

    let victors = game.survivors();
    assert_eq!(victors.len(), 2);

    let messages = chat.messages();
    assert_eq!(messages[0], manager::STARTING);
    assert!(messages.iter().any(|m| m.contains("Please welcome our brave tributes!")));
    assert!(messages.iter().any(|m| m.contains("**DAY 1**")));
    assert!(messages.last().unwrap().contains("The victors have won **Acme**!"));

    let directs = chat.directs();
    assert_eq!(directs.len(), 3);
    assert_eq!(directs[0].0, HOST);
    assert!(directs[0].1.contains("Please contact the following winners"));
    let notified: HashSet<UserId> = directs[1..].iter().map(|(u, _)| *u).collect();
    let expected: HashSet<UserId> = victors.iter().map(|p| p.id).collect();
    assert_eq!(notified, expected);
}

#[tokio::test(start_paused = true)]
async fn entry_reaction_is_seeded_on_the_announcement() {
    let (chat, manager) = setup();
    let game = manager.start_event(config(1, 1)).await.unwrap();
    let announcement = game.announcement().unwrap();

    assert!(chat.outbound().contains(&Outbound::Reaction {
        message: announcement,
        reaction: Settings::default().emojis.participant.reaction(),
    }));
    manager.cancel_event(CHANNEL);
}

#[tokio::test(start_paused = true)]
async fn clones_share_identity_but_victors_are_notified_once() {
    let (chat, manager) = setup();
    let mut cfg = config(3, 3);
    cfg.clone = 3;
    let game = manager.start_event(cfg).await.unwrap();
    enroll(&manager, game.announcement().unwrap().id, 1);

    assert_eq!(game.wait_terminal().await, EventState::Finished);
    settle().await;

    let victors = game.survivors();
    assert_eq!(victors.len(), 3);
    assert!(victors.iter().all(|p| p.id == UserId(1)));
    assert!(chat.messages().iter().any(|m| m.contains("CLONED 3 TIMES")));

    let directs = chat.directs();
    assert_eq!(directs.iter().filter(|(u, _)| *u == UserId(1)).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_roster_is_cancelled_without_starting() {
    let (chat, manager) = setup();
    let game = manager.start_event(config(1, 1)).await.unwrap();

    assert_eq!(game.wait_terminal().await, EventState::Cancelled);
    settle().await;

    let messages = chat.messages();
    assert!(messages.last().unwrap().starts_with("No tributes have come forward within 10 seconds"));
    assert!(!messages.iter().any(|m| m.contains("Please welcome")));
    assert!(game.survivors().is_empty());
    assert!(chat.directs().is_empty());
    assert!(manager.can_start(CHANNEL));
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn registration_is_idempotent_and_closes_at_start() {
    let (_chat, manager) = setup();
    let game = manager.start_event(config(1, 1)).await.unwrap();
    let token = game.announcement().unwrap().id;

    enroll(&manager, token, 1);
    enroll(&manager, token, 1);
    assert_eq!(game.entrant_count(), 1);

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(game.has_started());

    manager.handle_reaction(CHANNEL, token, &entry(), Participant::new(UserId(2), "late"));
    assert_eq!(game.entrant_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn mismatched_reactions_are_ignored() {
    let (_chat, manager) = setup();
    let game = manager.start_event(config(1, 1)).await.unwrap();
    let token = game.announcement().unwrap().id;
    let tribute = || Participant::new(UserId(5), "five");

    manager.handle_reaction(CHANNEL, MessageId(token.0 + 99), &entry(), tribute());
    manager.handle_reaction(CHANNEL, token, "👍", tribute());
    manager.handle_reaction(CHANNEL, token, &entry(), tribute().as_bot());
    manager.handle_reaction(ChannelId(7), token, &entry(), tribute());
    assert_eq!(game.entrant_count(), 0);

    manager.handle_reaction(CHANNEL, token, &entry(), tribute());
    assert_eq!(game.entrant_count(), 1);
    manager.cancel_event(CHANNEL);
}

// ---------------------------------------------------------------------------
// Single flight and cancellation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn concurrent_starts_yield_exactly_one_event() {
    let (chat, manager) = setup();
    let (a, b) = tokio::join!(
        manager.start_event(config(1, 1)),
        manager.start_event(config(2, 1))
    );

    let conflicts = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(StartError::AlreadyRunning { channel }) if *channel == CHANNEL))
        .count();
    assert_eq!(conflicts, 1);
    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
    assert!(chat.messages().iter().any(|m| m == manager::ALREADY_RUNNING));
    assert!(!manager.can_start(CHANNEL));
}

#[tokio::test(start_paused = true)]
async fn finished_event_does_not_block_the_next() {
    let (_chat, manager) = setup();
    let first = manager.start_event(config(1, 1)).await.unwrap();
    enroll(&manager, first.announcement().unwrap().id, 3);
    assert_eq!(first.wait_terminal().await, EventState::Finished);

    assert!(manager.can_start(CHANNEL));
    let second = manager.start_event(config(2, 1)).await.unwrap();
    assert_ne!(first.id(), second.id());
    assert_eq!(manager.game(CHANNEL).unwrap().id(), second.id());
    manager.cancel_event(CHANNEL);
}

#[tokio::test(start_paused = true)]
async fn cancel_before_start_stops_the_timer() {
    let (chat, manager) = setup();
    let game = manager.start_event(config(1, 1)).await.unwrap();
    enroll(&manager, game.announcement().unwrap().id, 5);

    assert!(manager.cancel_event(CHANNEL));
    assert!(!manager.cancel_event(CHANNEL));
    assert_eq!(game.wait_terminal().await, EventState::Cancelled);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(!chat.messages().iter().any(|m| m.contains("Please welcome")));
    assert!(manager.can_start(CHANNEL));
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_run_stops_narration() {
    let (chat, manager) = setup();
    let game = manager.start_event(config(9, 1)).await.unwrap();
    enroll(&manager, game.announcement().unwrap().id, 20);

    // Enrollment closes at 10s; days run at 11s and 12s.
    tokio::time::sleep(Duration::from_millis(12_500)).await;
    assert_eq!(game.state(), EventState::Started);
    let remaining = game.survivors().len();
    assert!(remaining > 1);

    manager.cancel_event(CHANNEL);
    assert_eq!(game.wait_terminal().await, EventState::Cancelled);
    let sent = chat.messages().len();

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(chat.messages().len(), sent);
    assert_eq!(game.survivors().len(), remaining);
    assert!(chat.directs().is_empty());
}

/// Stalls on the end-of-day roll call so a cancel can land mid-send.
struct SlowRollCall {
    inner: Arc<MemoryChat>,
    reached: Arc<Notify>,
}

#[async_trait]
impl ChatClient for SlowRollCall {
    async fn send(
        &self,
        channel: ChannelId,
        text: &str,
        style: MessageStyle,
    ) -> Result<MessageRef, DeliveryError> {
        if text.contains("remain at the end of day") {
            self.reached.notify_one();
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        self.inner.send(channel, text, style).await
    }

    async fn edit(&self, message: MessageRef, text: &str) -> Result<(), DeliveryError> {
        self.inner.edit(message, text).await
    }

    async fn react(&self, message: MessageRef, reaction: &str) -> Result<(), DeliveryError> {
        self.inner.react(message, reaction).await
    }

    async fn send_direct(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        self.inner.send_direct(user, text).await
    }
}

#[tokio::test(start_paused = true)]
async fn cancel_during_last_day_skips_finale() {
    let chat = Arc::new(MemoryChat::new());
    let reached = Arc::new(Notify::new());
    let client = SlowRollCall {
        inner: chat.clone(),
        reached: reached.clone(),
    };
    let manager = EventManager::new(Arc::new(client), Arc::new(Settings::default()));

    let game = manager.start_event(config(6, 1)).await.unwrap();
    enroll(&manager, game.announcement().unwrap().id, 2);

    // Two tributes and one victor: the first kill is also the last day.
    reached.notified().await;
    manager.cancel_event(CHANNEL);

    assert_eq!(game.wait_terminal().await, EventState::Cancelled);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(chat.messages().iter().all(|m| !m.contains("have concluded")));
    assert!(chat.directs().is_empty());
    assert_eq!(game.state(), EventState::Cancelled);
}

/// Entropy that is gone from the first draw.
struct Unplugged;

impl RandomSource for Unplugged {
    fn next_u64(&mut self) -> Result<u64, RandomError> {
        Err(RandomError::Entropy("device unplugged".into()))
    }
}

#[tokio::test(start_paused = true)]
async fn entropy_failure_cancels_with_roster_intact() {
    let (chat, manager) = setup();
    let mut cfg = config(2, 1);
    cfg.rng = Box::new(Unplugged);
    let game = manager.start_event(cfg).await.unwrap();
    enroll(&manager, game.announcement().unwrap().id, 5);

    assert_eq!(game.wait_terminal().await, EventState::Cancelled);
    settle().await;

    assert_eq!(chat.messages().last().unwrap(), "failed to run game for day 1");
    let ids: HashSet<UserId> = game.survivors().iter().map(|p| p.id).collect();
    assert_eq!(ids, (1..=5).map(UserId).collect());
    assert_eq!(game.survivors().len(), 5);
    assert!(chat.directs().is_empty());
    assert!(manager.can_start(CHANNEL));
}

// ---------------------------------------------------------------------------
// Refusals and failures
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn zero_victors_is_refused_before_any_state() {
    let (chat, manager) = setup();
    let err = manager.start_event(config(1, 0)).await.unwrap_err();
    assert!(matches!(err, StartError::Config(ConfigError::NoVictors)));
    assert!(chat.outbound().is_empty());
    assert!(manager.can_start(CHANNEL));
}

#[tokio::test(start_paused = true)]
async fn missing_channel_is_refused() {
    let (chat, manager) = setup();
    let mut cfg = config(1, 1);
    cfg.channel = None;
    let err = manager.start_event(cfg).await.unwrap_err();
    assert!(matches!(err, StartError::ChannelUnavailable));
    assert!(chat.outbound().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_announcement_leaves_no_entry() {
    let (chat, manager) = setup();
    // The acknowledgement and the announcement both fail.
    chat.fail_next_sends(2);

    let err = manager.start_event(config(1, 1)).await.unwrap_err();
    assert!(matches!(err, StartError::Announcement(_)));
    assert!(manager.can_start(CHANNEL));
    assert!(manager.game(CHANNEL).is_none());
    assert_eq!(chat.messages(), [manager::UNEXPECTED]);
}

#[tokio::test(start_paused = true)]
async fn direct_message_failure_does_not_block_victors() {
    let (chat, manager) = setup();
    chat.fail_direct_to(HOST);
    let game = manager.start_event(config(4, 1)).await.unwrap();
    enroll(&manager, game.announcement().unwrap().id, 4);

    assert_eq!(game.wait_terminal().await, EventState::Finished);
    settle().await;

    let winner = game.survivors()[0].id;
    let directs = chat.directs();
    assert_eq!(directs.len(), 1);
    assert_eq!(directs[0].0, winner);
    assert!(directs[0].1.contains("hosted by host (host)"));
}

#[tokio::test(start_paused = true)]
async fn narrator_posts_then_edits_while_waiting() {
    let (chat, manager) = setup();
    let mut cfg = config(1, 1);
    cfg.enrollment_delay = Duration::from_secs(60);
    cfg.jokes = Some(
        JokeBank::new(
            vec![
                Joke {
                    question: "Why?".into(),
                    answer: "Because.".into(),
                },
                Joke {
                    question: "How?".into(),
                    answer: "Carefully.".into(),
                },
            ],
            Box::new(SeededRandom::new(5)),
        )
        .unwrap(),
    );
    let game = manager.start_event(cfg).await.unwrap();
    assert_eq!(game.wait_terminal().await, EventState::Cancelled);

    let narrator = chat
        .outbound()
        .into_iter()
        .find_map(|o| match o {
            Outbound::Message { message, text, .. } if text.contains("Caesar Flickerman") => Some(message),
            _ => None,
        })
        .expect("narrator message");

    // Warm-up at 2s, then edits at 22s and 42s; enrollment closes at 60s.
    let edits = chat.edits();
    assert_eq!(edits.len(), 2);
    assert!(edits.iter().all(|(m, _)| *m == narrator));
}

// ---------------------------------------------------------------------------
// Command layer
// ---------------------------------------------------------------------------

fn commands(manager: &Arc<EventManager>) -> Commands {
    Commands::new(
        Arc::clone(manager),
        data::PHRASES_JSON.to_string(),
        None,
        Some(11),
    )
}

fn request(options: StartOptions) -> StartRequest {
    StartRequest {
        channel: Some(CHANNEL),
        channel_name: "arena".into(),
        started_by: Participant::new(HOST, "host").with_nickname("Effie"),
        options,
    }
}

#[tokio::test(start_paused = true)]
async fn command_warns_and_clamps_before_starting() {
    let (chat, manager) = setup();
    let cmds = commands(&manager);
    let game = cmds
        .start(request(StartOptions {
            delay_secs: Some(1),
            clone: Some(1_000),
            sponsor: Some("<<Capitol>>".into()),
            ..Default::default()
        }))
        .await
        .unwrap()
        .unwrap();

    let messages = chat.messages();
    assert_eq!(
        messages[0],
        "The delay of 1 is much too short. Hunger Games will wait for 60 seconds instead.\n\
         The multiplier of 1000 is much too high. Setting to 100 instead."
    );
    assert!(chat.outbound().iter().any(|o| matches!(
        o,
        Outbound::Message { style: MessageStyle::Quoted, text, .. } if text.starts_with("The delay")
    )));
    let announcement = chat
        .outbound()
        .into_iter()
        .find_map(|o| match o {
            Outbound::Message { message, text, .. } if Some(message) == game.announcement() => Some(text),
            _ => None,
        })
        .unwrap();
    assert!(announcement.contains("**Capitol**"));
    assert!(announcement.contains("100 times"));
    assert!(cmds.cancel(CHANNEL).await);
    assert_eq!(chat.messages().last().unwrap(), command::UPRISING);
}

#[tokio::test(start_paused = true)]
async fn command_with_zero_victors_creates_nothing() {
    let (chat, manager) = setup();
    let started = commands(&manager)
        .start(request(StartOptions {
            victors: Some(0),
            ..Default::default()
        }))
        .await
        .unwrap();

    assert!(started.is_none());
    assert_eq!(chat.messages(), [command::NO_VICTORS]);
    assert!(manager.game(CHANNEL).is_none());
    assert!(!commands(&manager).cancel(CHANNEL).await);
}
