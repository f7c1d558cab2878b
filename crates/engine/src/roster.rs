//! Participants and the enrollment roster.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Opaque platform identity. Clones share their original's id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An enrolled identity, populated once by the platform layer and immutable
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: UserId,
    pub username: String,
    pub nickname: Option<String>,
    /// Decorated name given to clones (`name-2`, `name-3`, ...).
    pub alias: Option<String>,
    pub bot: bool,
}

impl Participant {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            nickname: None,
            alias: None,
            bot: false,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into()).filter(|n: &String| !n.is_empty());
        self
    }

    pub fn as_bot(mut self) -> Self {
        self.bot = true;
        self
    }

    /// Clone alias, then nickname, then username.
    pub fn display_name(&self) -> &str {
        self.alias
            .as_deref()
            .or(self.nickname.as_deref())
            .unwrap_or(&self.username)
    }

    /// Name used in logs and private notifications: `nick (username)`.
    pub fn full_name(&self) -> String {
        let shown = self.nickname.as_deref().unwrap_or(&self.username);
        format!("{} ({})", shown, self.username)
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// A synthetic duplicate sharing this identity, numbered from 2.
    pub fn clone_numbered(&self, n: usize) -> Participant {
        Participant {
            alias: Some(format!("{}-{}", self.display_name(), n)),
            ..self.clone()
        }
    }
}

/// Enrollment roster: insertion-ordered, first registration per identity wins.
#[derive(Debug, Default, Clone)]
pub struct Entrants {
    by_id: IndexMap<UserId, Participant>,
}

impl Entrants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the identity was already registered.
    pub fn insert(&mut self, participant: Participant) -> bool {
        if self.by_id.contains_key(&participant.id) {
            return false;
        }
        self.by_id.insert(participant.id, participant);
        true
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.by_id.values()
    }

    /// Freeze enrollment into the list of tributes.
    ///
    /// Originals come first in registration order, followed by each
    /// participant's `clone - 1` copies.
    pub fn into_tributes(self, clone: usize) -> Vec<Participant> {
        let originals: Vec<Participant> = self.by_id.into_values().collect();
        let extra = clone.saturating_sub(1);
        let mut tributes = Vec::with_capacity(originals.len() * (extra + 1));
        tributes.extend(originals.iter().cloned());
        for p in &originals {
            for n in 2..=clone {
                tributes.push(p.clone_numbered(n));
            }
        }
        tributes
    }
}
