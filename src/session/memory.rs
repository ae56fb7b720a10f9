use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    models::ConversationId,
    session::{Mode, SessionStore},
};

struct PendingMode {
    mode: Mode,
    expires_at: DateTime<Utc>,
}

/// Session store kept in process memory, with the same expiry as the Redis backend
pub struct InMemorySessions {
    ttl: chrono::Duration,
    modes: RwLock<HashMap<ConversationId, PendingMode>>,
}

impl InMemorySessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365)),
            modes: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessions {
    async fn set_mode(&self, chat: ConversationId, mode: Mode) {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let mut modes = self.modes.write().await;
        // Drop anything that expired so abandoned chats do not pile up
        modes.retain(|_, pending| pending.expires_at > now);
        modes.insert(chat, PendingMode { mode, expires_at });
    }

    async fn take_mode(&self, chat: ConversationId) -> Option<Mode> {
        let pending = self.modes.write().await.remove(&chat)?;

        if pending.expires_at <= Utc::now() {
            tracing::debug!(chat_id = %chat, mode = %pending.mode, "Pending mode expired");
            return None;
        }

        Some(pending.mode)
    }

    async fn clear(&self, chat: ConversationId) {
        self.modes.write().await.remove(&chat);
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: ConversationId = ConversationId(42);

    #[tokio::test]
    async fn test_take_consumes_mode() {
        let sessions = InMemorySessions::new(Duration::from_secs(60));
        sessions.set_mode(CHAT, Mode::AwaitingUrl).await;

        assert_eq!(sessions.take_mode(CHAT).await, Some(Mode::AwaitingUrl));
        assert_eq!(sessions.take_mode(CHAT).await, None);
    }

    #[tokio::test]
    async fn test_set_replaces_previous_mode() {
        let sessions = InMemorySessions::new(Duration::from_secs(60));
        sessions.set_mode(CHAT, Mode::AwaitingUrl).await;
        sessions.set_mode(CHAT, Mode::AwaitingDeleteId).await;

        assert_eq!(sessions.take_mode(CHAT).await, Some(Mode::AwaitingDeleteId));
    }

    #[tokio::test]
    async fn test_modes_are_per_conversation() {
        let sessions = InMemorySessions::new(Duration::from_secs(60));
        sessions.set_mode(CHAT, Mode::AwaitingUrl).await;

        assert_eq!(sessions.take_mode(ConversationId(7)).await, None);
        sessions.clear(CHAT).await;
        assert_eq!(sessions.take_mode(CHAT).await, None);
    }

    #[tokio::test]
    async fn test_expired_mode_is_ignored() {
        let sessions = InMemorySessions::new(Duration::ZERO);
        sessions.set_mode(CHAT, Mode::AwaitingUrl).await;

        assert_eq!(sessions.take_mode(CHAT).await, None);
    }
}
