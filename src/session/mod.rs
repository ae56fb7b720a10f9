//! Per-conversation session state
//!
//! The conversation controller remembers what the next plain-text message from a
//! chat means (a movie link, or an id to delete). That state belongs to the
//! conversation, not to the watchlist, and lives behind [`SessionStore`].

use std::{fmt::Display, str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{config::Config, db, models::ConversationId};

pub mod memory;
pub mod redis;

pub use memory::InMemorySessions;
pub use self::redis::RedisSessions;

/// What the next text message of a conversation is expected to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Next text is a movie link to add
    AwaitingUrl,
    /// Next text is the id of a movie to delete
    AwaitingDeleteId,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::AwaitingUrl => write!(f, "awaiting_url"),
            Mode::AwaitingDeleteId => write!(f, "awaiting_delete_id"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_url" => Ok(Mode::AwaitingUrl),
            "awaiting_delete_id" => Ok(Mode::AwaitingDeleteId),
            other => Err(format!("unknown session mode: {}", other)),
        }
    }
}

/// Storage for conversation modes.
///
/// Session state is best effort: backends log their own failures and behave as if
/// no mode were set, so a flaky session store never blocks watchlist operations.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Sets the pending mode, replacing any previous one
    async fn set_mode(&self, chat: ConversationId, mode: Mode);

    /// Removes and returns the pending mode
    async fn take_mode(&self, chat: ConversationId) -> Option<Mode>;

    /// Drops any pending mode
    async fn clear(&self, chat: ConversationId);

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Builds the session store selected in the configuration
pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn SessionStore>> {
    let ttl = Duration::from_secs(config.session_ttl_secs);

    let sessions: Arc<dyn SessionStore> = match config.redis_url.as_deref() {
        Some(redis_url) => {
            let client = db::create_redis_client(redis_url)?;
            Arc::new(RedisSessions::new(client, ttl))
        }
        None => Arc::new(InMemorySessions::new(ttl)),
    };

    tracing::info!(backend = sessions.name(), ttl_secs = ttl.as_secs(), "Session store ready");

    Ok(sessions)
}
