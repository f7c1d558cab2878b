//! Phrase and joke banks: exhaustion windows, substitution and loading.

use std::collections::{HashMap, HashSet};

use arena_engine::content::ContentError;
use arena_engine::random::SeededRandom;
use arena_engine::{Joke, JokeBank, PhraseBank};

const PHRASES: &str = r#"[
    "{dying} was ambushed by {killer}.",
    "{killer} pushed {dying} off a cliff.",
    "{dying} tripped over a root. {killer} laughed.",
    "{killer} and {dying} shared a meal. Only {killer} woke up.",
    "{dying} froze overnight."
]"#;

#[test]
fn first_window_renders_every_phrase_once() {
    let mut bank = PhraseBank::from_json(PHRASES, Box::new(SeededRandom::new(11))).unwrap();
    let n = bank.len();
    assert_eq!(n, 5);

    let first: HashSet<String> = (0..n).map(|_| bank.next("K", "D").unwrap()).collect();
    assert_eq!(first.len(), n);

    // Second window: again every phrase exactly once.
    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..n {
        *counts.entry(bank.next("K", "D").unwrap()).or_default() += 1;
    }
    assert_eq!(counts.len(), n);
    assert!(counts.values().all(|&c| c == 1));
    assert_eq!(counts.keys().cloned().collect::<HashSet<_>>(), first);
}

#[test]
fn draw_after_a_full_window_may_repeat() {
    let mut bank = PhraseBank::new(&["only {dying}"], Box::new(SeededRandom::new(1))).unwrap();
    assert_eq!(bank.next("K", "<@1>").unwrap(), "only <@1>");
    assert_eq!(bank.next("K", "<@2>").unwrap(), "only <@2>");
}

#[test]
fn killer_and_dying_are_substituted_everywhere() {
    let mut bank = PhraseBank::new(
        &["{killer} gave {dying} a poison flower, and {dying} said thanks while {killer} laughed"],
        Box::new(SeededRandom::new(1)),
    )
    .unwrap();
    assert_eq!(
        bank.next("Player 1", "<@123>").unwrap(),
        "Player 1 gave <@123> a poison flower, and <@123> said thanks while Player 1 laughed"
    );
}

#[test]
fn empty_collections_are_rejected() {
    let empty: [&str; 0] = [];
    assert!(matches!(
        PhraseBank::new(&empty, Box::new(SeededRandom::new(1))),
        Err(ContentError::NoContent("phrase"))
    ));
    assert!(matches!(
        PhraseBank::from_json("[]", Box::new(SeededRandom::new(1))),
        Err(ContentError::NoContent(_))
    ));
    assert!(matches!(
        JokeBank::new(Vec::new(), Box::new(SeededRandom::new(1))),
        Err(ContentError::NoContent("joke"))
    ));
}

#[test]
fn bad_template_reports_its_index() {
    let result = PhraseBank::new(
        &["{dying} fell.", "{victim} fell."],
        Box::new(SeededRandom::new(1)),
    );
    assert!(matches!(result, Err(ContentError::Template { index: 1, .. })));
}

#[test]
fn malformed_json_is_a_payload_error() {
    assert!(matches!(
        PhraseBank::from_json("{not json", Box::new(SeededRandom::new(1))),
        Err(ContentError::Payload { kind: "phrase", .. })
    ));
}

#[test]
fn jokes_cycle_without_repeats() {
    let json = r#"[
        {"q": "Why did the tribute cross the arena?", "a": "To get to the cornucopia."},
        {"q": "What do mockingjays sing?", "a": "Whatever you whistle."},
        {"q": "Why are careers bad at hide and seek?", "a": "They always volunteer."}
    ]"#;
    let mut bank = JokeBank::from_json(json, Box::new(SeededRandom::new(5))).unwrap();
    assert_eq!(bank.len(), 3);

    let seen: HashSet<Joke> = (0..3).map(|_| bank.next().unwrap().clone()).collect();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().any(|j| j.answer == "They always volunteer."));
}
