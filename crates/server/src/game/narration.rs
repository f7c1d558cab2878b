//! User-facing text for one event. Pure functions over engine values so the
//! wording can be tested without a runtime.

use std::time::Duration;

use arena_engine::{DayOutcome, Participant, UserId};

use crate::config::Emojis;

/// Zero-width space: a line the platform renders as empty instead of
/// collapsing it.
pub const BLANK: &str = "\u{200b}";

const HOST_GREETING: &str = "Greetings, esteemed guests and citizens of the Capitol! \
I am Caesar Flickerman, the host of this year's Hunger Games! While we wait for \
our tributes to volunteer, allow me to entertain you with the finest collection \
of fatherly quips this side of the Districts.";

pub struct AnnouncementParams<'a> {
    pub delay: Duration,
    pub sponsor: &'a str,
    pub victors: usize,
    pub clone: usize,
    pub minimum_tier: Option<u32>,
}

/// `90s` reads as `1 minute 30 seconds`.
pub fn format_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    let (m, s) = (secs / 60, secs % 60);
    let unit = |n: u64, word: &str| {
        if n == 1 {
            format!("1 {}", word)
        } else {
            format!("{} {}s", n, word)
        }
    };
    match (m, s) {
        (0, s) => unit(s, "second"),
        (m, 0) => unit(m, "minute"),
        (m, s) => format!("{} {}", unit(m, "minute"), unit(s, "second")),
    }
}

pub fn announcement(emojis: &Emojis, p: &AnnouncementParams<'_>) -> String {
    let mut lines = vec![
        format!(
            "{}  Attention citizens of Panem! The reaping for this year's Hunger Games, sponsored by **{}**, begins in {}.",
            emojis.escort.code(),
            p.sponsor,
            format_delay(p.delay)
        ),
        BLANK.to_string(),
        format!(
            "React with {} to volunteer as tribute. {} will be crowned victor.",
            emojis.participant.code(),
            match p.victors {
                1 => "Only one".to_string(),
                n => format!("{} tributes", n),
            }
        ),
    ];

    if p.clone > 1 {
        lines.push(format!(
            "{}  Every tribute enters the arena {} times.",
            emojis.clone.code(),
            p.clone
        ));
    }
    if let Some(tier) = p.minimum_tier {
        lines.push(format!("Tributes must be tier {} or above.", tier));
    }

    lines.push(BLANK.to_string());
    lines.push("May the odds be ever in your favor.".to_string());
    lines.join("\n")
}

/// Text the narrator prints above every joke.
pub fn narrator_preamble(emojis: &Emojis) -> String {
    format!("{}  {}", emojis.host.code(), HOST_GREETING)
}

pub fn no_entrants(delay: Duration) -> String {
    format!(
        "No tributes have come forward within {}. This district will be eliminated.",
        format_delay(delay)
    )
}

pub fn roster(emojis: &Emojis, tributes: &[Participant], clone: usize) -> Vec<String> {
    let names: Vec<&str> = tributes.iter().map(|p| p.display_name()).collect();
    let mut lines = vec![
        format!("{}  Please welcome our brave tributes!", emojis.host.code()),
        BLANK.to_string(),
        "What a fantastic group of individuals we have for this year's contest:".to_string(),
        names.join(", "),
    ];

    if clone > 1 {
        let code = emojis.clone.code();
        lines.push(BLANK.to_string());
        lines.push(format!(
            "{}   **MEGA MODE ACTIVATED: TRIBUTES WILL BE CLONED {} TIMES**   {}",
            code, clone, code
        ));
    }
    lines
}

pub fn day(emojis: &Emojis, outcome: &DayOutcome) -> Vec<String> {
    let sun = emojis.day.code();
    let mut lines = vec![
        format!("{}   **DAY {}**   {}", sun, outcome.number(), sun),
        BLANK.to_string(),
    ];

    if outcome.is_quiet() {
        lines.push(format!("All was quiet on day {}.", outcome.number()));
        return lines;
    }

    lines.extend(outcome.eliminations.iter().map(|e| format!("• {}", e.line)));

    let names: Vec<&str> = outcome.survivors.iter().map(|p| p.display_name()).collect();
    lines.push(BLANK.to_string());
    lines.push(format!(
        "{}  {} player(s) remain at the end of day {}: {}",
        emojis.host.code(),
        outcome.survivors.len(),
        outcome.number(),
        names.join(", ")
    ));
    lines
}

pub fn day_failed(number: usize) -> String {
    format!("failed to run game for day {}", number)
}

pub fn finale(
    emojis: &Emojis,
    victors: &[Participant],
    sponsor: &str,
    notify: Option<UserId>,
    mention: bool,
) -> Vec<String> {
    let names: Vec<String> = victors
        .iter()
        .map(|p| {
            if mention {
                p.mention()
            } else {
                format!("**{}**", p.display_name())
            }
        })
        .collect();

    let (winner, victor, victor_has) = if victors.len() > 1 {
        ("winners", "victors", "victors have")
    } else {
        ("winner", "victor", "victor has")
    };

    let mut lines = vec![
        format!(
            "{}  This year's Hunger Games have concluded. Congratulations to our new {}: {}!",
            emojis.host.code(),
            victor,
            names.join(", ")
        ),
        BLANK.to_string(),
        format!(
            "{}  The tributes all demonstrated exceptional survival skills but the {} emerged victorious. Their combat prowess is a testament to the superiority of the Capitol's training.",
            emojis.president.code(),
            winner
        ),
        BLANK.to_string(),
        format!("The {} won **{}**!", victor_has, sponsor),
    ];

    if let Some(user) = notify {
        lines.push(BLANK.to_string());
        lines.push(format!("(fyi <@{}>)", user));
    }
    lines
}

/// Private note to whoever started the event.
pub fn initiator_summary(victors: &[Participant]) -> String {
    if victors.is_empty() {
        return "Your Hunger Games event has finished but sadly there were no participants."
            .to_string();
    }
    let list: Vec<String> = victors
        .iter()
        .map(|p| format!("* {}", p.full_name()))
        .collect();
    format!(
        "Your Hunger Games event has finished! Please contact the following winners:\n{}",
        list.join("\n")
    )
}

pub fn victor_congratulations(started_by: &Participant) -> String {
    format!(
        "Congratulations, you won the Hunger Games event hosted by {}! Please get in touch with them if you haven't already.",
        started_by.full_name()
    )
}
