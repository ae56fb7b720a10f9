use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode},
    ApiError, RequestError,
};

use crate::{
    bot::reply::{Keyboard, Reply, ReplyTarget},
    error::TransportError,
    models::ConversationId,
};

/// Delivery side of the chat: puts controller replies on screen
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Shows `reply` in `chat`, as a new message or in place of the pressed one
    async fn deliver(&self, chat: ConversationId, reply: &Reply) -> Result<(), TransportError>;

    /// Acknowledges a button press so the client stops its loading indicator
    async fn answer_button(&self, query: &CallbackQuery) -> Result<(), TransportError>;
}

/// Telegram Bot API transport
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn send_new(&self, chat_id: ChatId, reply: &Reply) -> Result<(), TransportError> {
        self.bot
            .send_message(chat_id, &reply.text)
            .parse_mode(ParseMode::Html)
            .reply_markup(to_markup(&reply.keyboard))
            .await?;
        Ok(())
    }
}

/// Converts a controller keyboard into Telegram inline markup
pub fn to_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.action.to_string()))
            .collect::<Vec<_>>()
    }))
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn deliver(&self, chat: ConversationId, reply: &Reply) -> Result<(), TransportError> {
        let chat_id = ChatId(chat.0);

        match reply.target {
            ReplyTarget::New => {}
            ReplyTarget::Edit(message_id) => {
                let edited = self
                    .bot
                    .edit_message_text(chat_id, MessageId(message_id), &reply.text)
                    .parse_mode(ParseMode::Html)
                    .reply_markup(to_markup(&reply.keyboard))
                    .await;

                match edited {
                    Ok(_) => return Ok(()),
                    // Same screen pressed twice, nothing to update
                    Err(RequestError::Api(ApiError::MessageNotModified)) => return Ok(()),
                    Err(e) => {
                        tracing::warn!(
                            chat_id = %chat,
                            message_id,
                            error = %e,
                            "Edit failed, sending a new message instead"
                        );
                    }
                }
            }
            ReplyTarget::Replace(message_id) => {
                if let Err(e) = self
                    .bot
                    .delete_message(chat_id, MessageId(message_id))
                    .await
                {
                    tracing::debug!(chat_id = %chat, message_id, error = %e, "Could not delete old message");
                }
            }
        }

        self.send_new(chat_id, reply).await
    }

    async fn answer_button(&self, query: &CallbackQuery) -> Result<(), TransportError> {
        self.bot.answer_callback_query(query.id.clone()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_keeps_layout_and_callback_data() {
        let markup = to_markup(&Keyboard::main_menu());

        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][1].text, "🧹 Clean up");

        let json = serde_json::to_value(&markup).unwrap();
        assert_eq!(json["inline_keyboard"][0][0]["callback_data"], "add");
        assert_eq!(json["inline_keyboard"][0][1]["callback_data"], "random");
    }

    #[test]
    fn test_markup_for_random_pick_buttons() {
        let markup = to_markup(&Keyboard::random_pick(5));
        let json = serde_json::to_value(&markup).unwrap();

        assert_eq!(json["inline_keyboard"][1][0]["callback_data"], "watched:5");
        assert_eq!(json["inline_keyboard"][1][1]["callback_data"], "delete:5");
    }
}
