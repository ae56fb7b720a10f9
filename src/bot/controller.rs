use std::sync::Arc;

use teloxide::utils::html;

use crate::{
    bot::{
        action::Action,
        inbound::{Command, Inbound},
        reply::{Keyboard, Reply, ReplyTarget},
    },
    error::WatchlistError,
    models::{ConversationId, MovieEntry, MovieId, WatchlistStats},
    services::WatchlistService,
    session::{Mode, SessionStore},
};

const WELCOME: &str = "🎬 <b>Movie picker</b>\n\n\
    Your movies are saved and survive restarts.\n\n\
    Choose an action:";
const MAIN_MENU: &str = "🎬 Main menu:";
const STORE_UNAVAILABLE: &str = "⚠️ Storage is unavailable right now, please try again later.";

/// Maps commands, texts and button presses to watchlist operations and renders the
/// resulting screen. Pending input modes are kept per conversation in the session store.
pub struct Controller {
    watchlist: Arc<WatchlistService>,
    sessions: Arc<dyn SessionStore>,
}

impl Controller {
    pub fn new(watchlist: Arc<WatchlistService>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            watchlist,
            sessions,
        }
    }

    pub fn watchlist(&self) -> &WatchlistService {
        &self.watchlist
    }

    pub async fn handle(&self, inbound: Inbound) -> Reply {
        match inbound {
            Inbound::Command { chat, command } => self.on_command(chat, command).await,
            Inbound::Text { chat, text } => self.on_text(chat, &text).await,
            Inbound::Button {
                chat,
                message,
                data,
            } => self.on_button(chat, message, &data).await,
        }
    }

    async fn on_command(&self, chat: ConversationId, command: Command) -> Reply {
        tracing::debug!(chat_id = %chat, ?command, "Command received");
        self.sessions.clear(chat).await;
        Reply::new(WELCOME, Keyboard::main_menu(), ReplyTarget::New)
    }

    async fn on_text(&self, chat: ConversationId, text: &str) -> Reply {
        match self.sessions.take_mode(chat).await {
            Some(Mode::AwaitingUrl) => self.add_movie(chat, text).await,
            Some(Mode::AwaitingDeleteId) => self.delete_by_typed_id(chat, text).await,
            None => Reply::new(
                "Use the menu below to manage your movies.",
                Keyboard::main_menu(),
                ReplyTarget::New,
            ),
        }
    }

    async fn on_button(&self, chat: ConversationId, message: i32, data: &str) -> Reply {
        let edit = ReplyTarget::Edit(message);

        let action = match data.parse::<Action>() {
            Ok(action) => action,
            Err(e) => {
                tracing::warn!(chat_id = %chat, error = %e, "Ignoring unknown button");
                self.sessions.clear(chat).await;
                return Reply::new(MAIN_MENU, Keyboard::main_menu(), edit);
            }
        };

        // Any button other than the two prompts abandons a pending input
        match action {
            Action::Add => self.sessions.set_mode(chat, Mode::AwaitingUrl).await,
            Action::ClearOne => self.sessions.set_mode(chat, Mode::AwaitingDeleteId).await,
            _ => self.sessions.clear(chat).await,
        }

        match action {
            Action::Menu => Reply::new(MAIN_MENU, Keyboard::main_menu(), edit),
            Action::Add => Reply::new(
                "➕ Send a link to the movie (YouTube, Kinopoisk, etc.):",
                Keyboard::back_to_menu("↩️ Back"),
                edit,
            ),
            Action::List => self.list(chat, message).await,
            Action::Random => self.random(chat, message).await,
            Action::Watched(id) => match self.watchlist.mark_watched(chat, id).await {
                Ok(true) => Reply::new("✅ Marked as watched", Keyboard::main_menu(), edit),
                Ok(false) => Reply::new("❌ Movie not found", Keyboard::main_menu(), edit),
                Err(e) => store_failure(chat, e, edit),
            },
            Action::Delete(id) => match self.watchlist.delete_by_id(chat, id).await {
                Ok(true) => Reply::new("🗑 Movie deleted", Keyboard::main_menu(), edit),
                Ok(false) => Reply::new("❌ Movie not found", Keyboard::main_menu(), edit),
                Err(e) => store_failure(chat, e, edit),
            },
            Action::Clear => Reply::new(
                "🧹 <b>What should be removed?</b>",
                Keyboard::clear_menu(),
                edit,
            ),
            Action::ClearOne => Reply::new(
                "🗑 Send the ID of the movie to delete:",
                Keyboard::back_to_menu("↩️ Cancel"),
                edit,
            ),
            Action::ClearWatched => match self.watchlist.delete_watched(chat).await {
                Ok(removed) => Reply::new(
                    format!("✅ Watched movies removed: {}", removed),
                    Keyboard::main_menu(),
                    edit,
                ),
                Err(e) => store_failure(chat, e, edit),
            },
            Action::ClearAll => Reply::new(
                "⚠️ <b>Delete ALL movies?</b>\nThis cannot be undone!",
                Keyboard::confirm_clear_all(),
                edit,
            ),
            Action::ClearAllConfirmed => match self.watchlist.delete_all(chat).await {
                Ok(_) => Reply::new("💥 All movies deleted", Keyboard::main_menu(), edit),
                Err(e) => store_failure(chat, e, edit),
            },
        }
    }

    async fn add_movie(&self, chat: ConversationId, text: &str) -> Reply {
        match self.watchlist.add(chat, text).await {
            Ok(id) => Reply::new(
                format!("✅ Movie added under ID {}!", id),
                Keyboard::after_add(),
                ReplyTarget::New,
            ),
            Err(WatchlistError::InvalidUrl(_)) => Reply::new(
                "❌ That is not a link. Send a valid link.",
                Keyboard::main_menu(),
                ReplyTarget::New,
            ),
            Err(WatchlistError::Duplicate(_)) => Reply::new(
                "⚠️ This movie is already on your list!",
                Keyboard::main_menu(),
                ReplyTarget::New,
            ),
            Err(e) => store_failure(chat, e, ReplyTarget::New),
        }
    }

    async fn delete_by_typed_id(&self, chat: ConversationId, text: &str) -> Reply {
        let Ok(typed) = text.trim().parse::<i64>() else {
            return Reply::new(
                "❌ Send a number (the movie ID)",
                Keyboard::main_menu(),
                ReplyTarget::New,
            );
        };

        let not_found = || {
            Reply::new(
                format!("❌ Movie with ID {} not found", typed),
                Keyboard::main_menu(),
                ReplyTarget::New,
            )
        };

        // Negative ids never exist
        let Ok(id) = MovieId::try_from(typed) else {
            return not_found();
        };

        match self.watchlist.delete_by_id(chat, id).await {
            Ok(true) => Reply::new(
                format!("🗑 Movie with ID {} deleted", id),
                Keyboard::main_menu(),
                ReplyTarget::New,
            ),
            Ok(false) => not_found(),
            Err(e) => store_failure(chat, e, ReplyTarget::New),
        }
    }

    async fn list(&self, chat: ConversationId, message: i32) -> Reply {
        let entries = self.watchlist.list(chat).await;
        let target = ReplyTarget::Replace(message);

        if entries.is_empty() {
            return Reply::new("📭 Your list is empty", Keyboard::main_menu(), target);
        }

        Reply::new(render_list(&entries), Keyboard::list(), target)
    }

    async fn random(&self, chat: ConversationId, message: i32) -> Reply {
        let edit = ReplyTarget::Edit(message);

        match self.watchlist.pick_random_unwatched(chat).await {
            Some(entry) => Reply::new(
                format!("🎲 <b>Random movie:</b>\n{}", html::escape(&entry.url)),
                Keyboard::random_pick(entry.id),
                edit,
            ),
            None => Reply::new(
                "❌ No unwatched movies available",
                Keyboard::main_menu(),
                edit,
            ),
        }
    }
}

fn store_failure(chat: ConversationId, error: WatchlistError, target: ReplyTarget) -> Reply {
    tracing::error!(chat_id = %chat, error = %error, "Watchlist write failed");
    Reply::new(STORE_UNAVAILABLE, Keyboard::main_menu(), target)
}

/// Unwatched first, then watched, then the totals footer
fn render_list(entries: &[MovieEntry]) -> String {
    let stats = WatchlistStats::from_entries(entries);
    let mut text = String::from("📋 <b>Your movies</b>\n\n");

    let unwatched: Vec<&MovieEntry> = entries.iter().filter(|e| !e.watched).collect();
    let watched: Vec<&MovieEntry> = entries.iter().filter(|e| e.watched).collect();

    if !unwatched.is_empty() {
        text.push_str("🎬 <b>Not watched:</b>\n");
        for entry in &unwatched {
            text.push_str(&format!("{}. {}\n", entry.id, html::escape(&entry.url)));
        }
        text.push('\n');
    }

    if !watched.is_empty() {
        text.push_str("✅ <b>Watched:</b>\n");
        for entry in &watched {
            text.push_str(&format!("{}. {}\n", entry.id, html::escape(&entry.url)));
        }
    }

    text.push_str(&format!(
        "\nTotal: {} | ✅ {} | 🎬 {}",
        stats.total, stats.watched, stats.unwatched
    ));

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{session::InMemorySessions, store::MemoryStore};
    use std::time::Duration;

    const CHAT: ConversationId = ConversationId(42);
    const MESSAGE: i32 = 100;

    fn controller() -> Controller {
        let watchlist = Arc::new(WatchlistService::new(Arc::new(MemoryStore::new())));
        let sessions = Arc::new(InMemorySessions::new(Duration::from_secs(60)));
        Controller::new(watchlist, sessions)
    }

    fn text(text: &str) -> Inbound {
        Inbound::Text {
            chat: CHAT,
            text: text.to_string(),
        }
    }

    fn button(action: Action) -> Inbound {
        Inbound::Button {
            chat: CHAT,
            message: MESSAGE,
            data: action.to_string(),
        }
    }

    #[tokio::test]
    async fn test_start_shows_main_menu() {
        let controller = controller();
        let reply = controller
            .handle(Inbound::Command {
                chat: CHAT,
                command: Command::Start,
            })
            .await;

        assert_eq!(reply.target, ReplyTarget::New);
        assert_eq!(reply.keyboard, Keyboard::main_menu());
        assert!(reply.text.contains("Movie picker"));
    }

    #[tokio::test]
    async fn test_add_flow() {
        let controller = controller();

        let prompt = controller.handle(button(Action::Add)).await;
        assert_eq!(prompt.target, ReplyTarget::Edit(MESSAGE));
        assert_eq!(prompt.keyboard.actions(), vec![Action::Menu]);

        let added = controller.handle(text("https://youtu.be/abc")).await;
        assert_eq!(added.text, "✅ Movie added under ID 1!");
        assert_eq!(added.keyboard, Keyboard::after_add());

        // The mode is consumed by the first message
        let hint = controller.handle(text("https://youtu.be/def")).await;
        assert!(hint.text.contains("Use the menu"));
        assert_eq!(controller.watchlist().list(CHAT).await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_rejects_non_link_and_duplicate() {
        let controller = controller();

        controller.handle(button(Action::Add)).await;
        let reply = controller.handle(text("The Matrix")).await;
        assert!(reply.text.contains("not a link"));

        controller.handle(button(Action::Add)).await;
        controller.handle(text("http://a")).await;
        controller.handle(button(Action::Add)).await;
        let reply = controller.handle(text("http://a")).await;
        assert!(reply.text.contains("already on your list"));

        assert_eq!(controller.watchlist().list(CHAT).await.len(), 1);
    }

    #[tokio::test]
    async fn test_back_button_cancels_pending_add() {
        let controller = controller();

        controller.handle(button(Action::Add)).await;
        controller.handle(button(Action::Menu)).await;
        controller.handle(text("http://a")).await;

        assert!(controller.watchlist().list(CHAT).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_typed_id() {
        let controller = controller();
        controller.watchlist().add(CHAT, "http://a").await.unwrap();

        controller.handle(button(Action::ClearOne)).await;
        let reply = controller.handle(text("abc")).await;
        assert_eq!(reply.text, "❌ Send a number (the movie ID)");

        controller.handle(button(Action::ClearOne)).await;
        let reply = controller.handle(text("7")).await;
        assert_eq!(reply.text, "❌ Movie with ID 7 not found");

        controller.handle(button(Action::ClearOne)).await;
        let reply = controller.handle(text("-1")).await;
        assert_eq!(reply.text, "❌ Movie with ID -1 not found");

        controller.handle(button(Action::ClearOne)).await;
        let reply = controller.handle(text("0")).await;
        assert_eq!(reply.text, "❌ Movie with ID 0 not found");
        assert_eq!(controller.watchlist().list(CHAT).await.len(), 1);

        controller.handle(button(Action::ClearOne)).await;
        let reply = controller.handle(text(" 1 ")).await;
        assert_eq!(reply.text, "🗑 Movie with ID 1 deleted");
        assert!(controller.watchlist().list(CHAT).await.is_empty());
    }

    #[tokio::test]
    async fn test_random_pick_offers_watched_and_delete() {
        let controller = controller();

        let reply = controller.handle(button(Action::Random)).await;
        assert_eq!(reply.text, "❌ No unwatched movies available");

        controller.watchlist().add(CHAT, "http://a?x=1&y=2").await.unwrap();
        let reply = controller.handle(button(Action::Random)).await;
        assert_eq!(reply.text, "🎲 <b>Random movie:</b>\nhttp://a?x=1&amp;y=2");
        assert_eq!(
            reply.keyboard.actions(),
            vec![Action::Random, Action::Watched(1), Action::Delete(1), Action::Menu]
        );

        let reply = controller.handle(button(Action::Watched(1))).await;
        assert_eq!(reply.text, "✅ Marked as watched");
        let reply = controller.handle(button(Action::Random)).await;
        assert_eq!(reply.text, "❌ No unwatched movies available");
    }

    #[tokio::test]
    async fn test_list_groups_by_status() {
        let controller = controller();

        let reply = controller.handle(button(Action::List)).await;
        assert_eq!(reply.text, "📭 Your list is empty");
        assert_eq!(reply.target, ReplyTarget::Replace(MESSAGE));

        controller.watchlist().add(CHAT, "http://a").await.unwrap();
        controller.watchlist().add(CHAT, "http://b").await.unwrap();
        controller.watchlist().mark_watched(CHAT, 1).await.unwrap();

        let reply = controller.handle(button(Action::List)).await;
        assert_eq!(
            reply.text,
            "📋 <b>Your movies</b>\n\n\
             🎬 <b>Not watched:</b>\n2. http://b\n\n\
             ✅ <b>Watched:</b>\n1. http://a\n\
             \nTotal: 2 | ✅ 1 | 🎬 1"
        );
        assert_eq!(reply.keyboard, Keyboard::list());
    }

    #[tokio::test]
    async fn test_clear_flows() {
        let controller = controller();
        for url in ["http://a", "http://b", "http://c"] {
            controller.watchlist().add(CHAT, url).await.unwrap();
        }
        controller.watchlist().mark_watched(CHAT, 2).await.unwrap();

        let reply = controller.handle(button(Action::ClearWatched)).await;
        assert_eq!(reply.text, "✅ Watched movies removed: 1");

        let confirm = controller.handle(button(Action::ClearAll)).await;
        assert_eq!(
            confirm.keyboard.actions(),
            vec![Action::ClearAllConfirmed, Action::Menu]
        );
        assert_eq!(controller.watchlist().list(CHAT).await.len(), 2);

        let reply = controller.handle(button(Action::ClearAllConfirmed)).await;
        assert_eq!(reply.text, "💥 All movies deleted");
        assert!(controller.watchlist().list(CHAT).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_button_returns_to_menu() {
        let controller = controller();
        let reply = controller
            .handle(Inbound::Button {
                chat: CHAT,
                message: MESSAGE,
                data: "clear_yes".to_string(),
            })
            .await;

        assert_eq!(reply.text, MAIN_MENU);
        assert_eq!(reply.target, ReplyTarget::Edit(MESSAGE));
    }
}
