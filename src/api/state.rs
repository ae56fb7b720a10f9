use std::sync::Arc;

use crate::bot::BotRuntime;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub runtime: BotRuntime,
    /// Path secret Telegram must post updates to (the bot token)
    pub webhook_token: Arc<str>,
}

impl AppState {
    /// Creates application state around a bot runtime
    pub fn new(runtime: BotRuntime, webhook_token: impl Into<Arc<str>>) -> Self {
        Self {
            runtime,
            webhook_token: webhook_token.into(),
        }
    }
}
