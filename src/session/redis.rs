use std::{fmt::Display, time::Duration};

use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisResult};

use crate::{
    models::ConversationId,
    session::{Mode, SessionStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Mode(ConversationId),
}

impl Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKey::Mode(chat) => write!(f, "session:mode:{}", chat),
        }
    }
}

/// Session store keeping modes in Redis with an expiry
///
/// Useful when the bot is redeployed often: a user who pressed "Add" right before a
/// restart can still send their link afterwards.
#[derive(Clone)]
pub struct RedisSessions {
    redis_client: Client,
    ttl_secs: u64,
}

impl RedisSessions {
    pub fn new(redis_client: Client, ttl: Duration) -> Self {
        Self {
            redis_client,
            // SET EX rejects a zero expiry
            ttl_secs: ttl.as_secs().max(1),
        }
    }

    async fn try_set(&self, key: SessionKey, mode: Mode) -> RedisResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key.to_string(), mode.to_string(), self.ttl_secs).await?;
        Ok(())
    }

    async fn try_take(&self, key: SessionKey) -> RedisResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key.to_string()).await?;
        if value.is_some() {
            let _: () = conn.del(key.to_string()).await?;
        }
        Ok(value)
    }

    async fn try_clear(&self, key: SessionKey) -> RedisResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(key.to_string()).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for RedisSessions {
    async fn set_mode(&self, chat: ConversationId, mode: Mode) {
        if let Err(e) = self.try_set(SessionKey::Mode(chat), mode).await {
            tracing::error!(chat_id = %chat, error = %e, "Failed to store session mode in Redis");
        }
    }

    async fn take_mode(&self, chat: ConversationId) -> Option<Mode> {
        match self.try_take(SessionKey::Mode(chat)).await {
            Ok(Some(raw)) => match raw.parse::<Mode>() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    tracing::warn!(chat_id = %chat, error = %e, "Ignoring unreadable session mode");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::error!(chat_id = %chat, error = %e, "Failed to read session mode from Redis");
                None
            }
        }
    }

    async fn clear(&self, chat: ConversationId) {
        if let Err(e) = self.try_clear(SessionKey::Mode(chat)).await {
            tracing::error!(chat_id = %chat, error = %e, "Failed to clear session mode in Redis");
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
