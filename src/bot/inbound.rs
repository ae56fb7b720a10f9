use teloxide::types::{Update, UpdateKind};

use crate::models::ConversationId;

/// Slash commands the bot answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

impl Command {
    /// Parses `/start`, `/help` and their `@botname` forms. Anything else is plain text.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);

        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            _ => None,
        }
    }
}

/// A user action the conversation controller reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Command {
        chat: ConversationId,
        command: Command,
    },
    Text {
        chat: ConversationId,
        text: String,
    },
    Button {
        chat: ConversationId,
        message: i32,
        data: String,
    },
}

impl Inbound {
    pub fn chat(&self) -> ConversationId {
        match self {
            Inbound::Command { chat, .. } | Inbound::Text { chat, .. } | Inbound::Button { chat, .. } => {
                *chat
            }
        }
    }

    /// Extracts the action from a Telegram update.
    ///
    /// Returns `None` for updates the bot does not handle (edits, stickers, button
    /// presses on messages Telegram no longer exposes, ...).
    pub fn from_update(update: &Update) -> Option<Self> {
        match &update.kind {
            UpdateKind::Message(msg) => {
                let chat = ConversationId(msg.chat.id.0);
                let text = msg.text()?.trim();

                match Command::parse(text) {
                    Some(command) => Some(Inbound::Command { chat, command }),
                    None => Some(Inbound::Text {
                        chat,
                        text: text.to_string(),
                    }),
                }
            }
            UpdateKind::CallbackQuery(query) => {
                let message = query.message.as_ref()?;
                let data = query.data.clone()?;

                Some(Inbound::Button {
                    chat: ConversationId(message.chat().id.0),
                    message: message.id().0,
                    data,
                })
            }
            _ => None,
        }
    }
}
