use crate::bot::action::Action;
use crate::models::MovieId;

/// Inline keyboard button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Rows of inline buttons attached to a reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    /// Every action reachable from this keyboard, row by row
    pub fn actions(&self) -> Vec<Action> {
        self.rows
            .iter()
            .flat_map(|row| row.iter().map(|button| button.action))
            .collect()
    }

    pub fn main_menu() -> Self {
        Self::new(vec![
            vec![
                Button::new("➕ Add", Action::Add),
                Button::new("🎲 Pick", Action::Random),
            ],
            vec![
                Button::new("📋 List", Action::List),
                Button::new("🧹 Clean up", Action::Clear),
            ],
        ])
    }

    pub fn back_to_menu(label: &str) -> Self {
        Self::new(vec![vec![Button::new(label, Action::Menu)]])
    }

    pub fn after_add() -> Self {
        Self::new(vec![vec![
            Button::new("➕ Add another", Action::Add),
            Button::new("🏠 Menu", Action::Menu),
        ]])
    }

    pub fn list() -> Self {
        Self::new(vec![vec![
            Button::new("🔄 Refresh", Action::List),
            Button::new("🏠 Menu", Action::Menu),
        ]])
    }

    pub fn random_pick(id: MovieId) -> Self {
        Self::new(vec![
            vec![Button::new("🔄 Pick again", Action::Random)],
            vec![
                Button::new("✅ Watched", Action::Watched(id)),
                Button::new("🗑 Delete", Action::Delete(id)),
            ],
            vec![Button::new("↩️ Menu", Action::Menu)],
        ])
    }

    pub fn clear_menu() -> Self {
        Self::new(vec![
            vec![
                Button::new("🗑 Delete by ID", Action::ClearOne),
                Button::new("✅ Delete watched", Action::ClearWatched),
            ],
            vec![
                Button::new("💥 Delete everything", Action::ClearAll),
                Button::new("↩️ Back", Action::Menu),
            ],
        ])
    }

    pub fn confirm_clear_all() -> Self {
        Self::new(vec![vec![
            Button::new("💥 Yes, delete everything", Action::ClearAllConfirmed),
            Button::new("↩️ Cancel", Action::Menu),
        ]])
    }
}

/// How a reply reaches the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTarget {
    /// Send a new message
    New,
    /// Edit the message whose button was pressed
    Edit(i32),
    /// Delete the message whose button was pressed and send a new one
    Replace(i32),
}

/// A screen produced by the conversation controller. Text is Telegram HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
    pub target: ReplyTarget,
}

impl Reply {
    pub fn new(text: impl Into<String>, keyboard: Keyboard, target: ReplyTarget) -> Self {
        Self {
            text: text.into(),
            keyboard,
            target,
        }
    }
}
