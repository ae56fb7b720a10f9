use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display, str::FromStr};

/// Identifier of the chat a watchlist belongs to (the Telegram chat id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(ConversationId)
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        ConversationId(id)
    }
}

/// Per-conversation movie id, assigned as max existing + 1
pub type MovieId = u64;

/// A single movie link on a watchlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieEntry {
    pub id: MovieId,
    pub url: String,
    #[serde(default)]
    pub watched: bool,
}

impl MovieEntry {
    /// Creates a new unwatched entry
    pub fn new(id: MovieId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            watched: false,
        }
    }
}

/// Every watchlist known to a record store, keyed by conversation.
///
/// Ordered so that serialization is stable across load/save cycles.
pub type Watchlists = BTreeMap<ConversationId, Vec<MovieEntry>>;

/// Counts shown in the footer of the list screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WatchlistStats {
    pub total: usize,
    pub watched: usize,
    pub unwatched: usize,
}

impl WatchlistStats {
    pub fn from_entries(entries: &[MovieEntry]) -> Self {
        let watched = entries.iter().filter(|e| e.watched).count();
        Self {
            total: entries.len(),
            watched,
            unwatched: entries.len() - watched,
        }
    }
}
