//! Conversation layer
//!
//! Telegram updates come in (webhook or long polling), are turned into [`Inbound`]
//! actions, handled by the [`Controller`] and the resulting [`Reply`] goes back out
//! through a [`ChatTransport`].

use std::sync::Arc;

use teloxide::types::{Update, UpdateKind};

use crate::error::TransportError;

pub mod action;
pub mod controller;
pub mod inbound;
pub mod polling;
pub mod reply;
pub mod transport;

pub use action::Action;
pub use controller::Controller;
pub use inbound::{Command, Inbound};
pub use reply::{Button, Keyboard, Reply, ReplyTarget};
pub use transport::{ChatTransport, TelegramTransport};

/// Controller plus transport: everything needed to process one update
#[derive(Clone)]
pub struct BotRuntime {
    controller: Arc<Controller>,
    transport: Arc<dyn ChatTransport>,
}

impl BotRuntime {
    pub fn new(controller: Arc<Controller>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            controller,
            transport,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Handles a single update to completion
    pub async fn handle_update(&self, update: Update) -> Result<(), TransportError> {
        if let UpdateKind::CallbackQuery(query) = &update.kind {
            if let Err(e) = self.transport.answer_button(query).await {
                tracing::warn!(error = %e, "Failed to answer button press");
            }
        }

        let Some(inbound) = Inbound::from_update(&update) else {
            tracing::debug!(update_id = update.id.0, "Ignoring unsupported update");
            return Ok(());
        };

        let chat = inbound.chat();
        let reply = self.controller.handle(inbound).await;
        self.transport.deliver(chat, &reply).await?;

        tracing::debug!(update_id = update.id.0, chat_id = %chat, "Update handled");

        Ok(())
    }
}
