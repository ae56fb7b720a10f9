use std::{future::Future, time::Duration};

use teloxide::{
    dispatching::{Dispatcher, UpdateHandler},
    dptree,
    prelude::*,
    RequestError,
};

use crate::bot::BotRuntime;

/// Routes every update to the bot runtime. Delivery failures are logged, never
/// returned, so the dispatcher keeps polling.
pub fn update_handler(runtime: BotRuntime) -> UpdateHandler<RequestError> {
    dptree::entry().endpoint(move |update: Update| {
        let runtime = runtime.clone();
        async move {
            let update_id = update.id.0;
            if let Err(e) = runtime.handle_update(update).await {
                tracing::error!(update_id, error = %e, "Failed to deliver reply");
            }
            respond(())
        }
    })
}

/// Receives updates through teloxide's long-polling dispatcher until `shutdown`
/// resolves.
///
/// The dispatcher removes any registered webhook, tracks the update offset and
/// backs off on `getUpdates` failures. Updates of one chat are handled in
/// arrival order.
pub async fn run_polling(
    bot: Bot,
    runtime: BotRuntime,
    shutdown: impl Future<Output = ()> + Send + 'static,
) {
    let mut dispatcher = Dispatcher::builder(bot, update_handler(runtime)).build();

    let shutdown_token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        shutdown.await;
        loop {
            match shutdown_token.shutdown() {
                Ok(stopped) => {
                    stopped.await;
                    break;
                }
                // Dispatcher not started yet
                Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }
    });

    tracing::info!("Long polling started");
    dispatcher.dispatch().await;
    tracing::info!("Long polling stopped");
}

#[cfg(test)]
mod tests {
    use std::{ops::ControlFlow, sync::Arc};

    use async_trait::async_trait;
    use teloxide::types::CallbackQuery;
    use tokio::sync::Mutex;

    use super::*;
    use crate::{
        bot::{ChatTransport, Controller, Keyboard, Reply},
        error::TransportError,
        models::ConversationId,
        services::WatchlistService,
        session::InMemorySessions,
        store::MemoryStore,
    };

    #[derive(Default)]
    struct RecordingTransport {
        delivered: Mutex<Vec<(ConversationId, Reply)>>,
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn deliver(&self, chat: ConversationId, reply: &Reply) -> Result<(), TransportError> {
            self.delivered.lock().await.push((chat, reply.clone()));
            Ok(())
        }

        async fn answer_button(&self, _query: &CallbackQuery) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn runtime(transport: Arc<RecordingTransport>) -> BotRuntime {
        let watchlist = Arc::new(WatchlistService::new(Arc::new(MemoryStore::new())));
        let sessions = Arc::new(InMemorySessions::new(Duration::from_secs(60)));
        BotRuntime::new(Arc::new(Controller::new(watchlist, sessions)), transport)
    }

    fn update(text: &str) -> Update {
        let json = serde_json::json!({
            "update_id": 5,
            "message": {
                "message_id": 3,
                "date": 1700000000i64,
                "chat": { "id": 42, "type": "private", "first_name": "Test" },
                "from": { "id": 42, "is_bot": false, "first_name": "Test" },
                "text": text,
            },
        });
        serde_json::from_str(&json.to_string()).expect("failed to deserialize mock update")
    }

    #[tokio::test]
    async fn test_handler_delivers_reply_for_update() {
        let transport = Arc::new(RecordingTransport::default());
        let handler = update_handler(runtime(transport.clone()));

        let result = handler.dispatch(dptree::deps![update("/start")]).await;

        assert!(matches!(result, ControlFlow::Break(Ok(()))));
        let delivered = transport.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, ConversationId(42));
        assert_eq!(delivered[0].1.keyboard, Keyboard::main_menu());
    }

    #[tokio::test]
    async fn test_handler_accepts_updates_without_reply() {
        let transport = Arc::new(RecordingTransport::default());
        let handler = update_handler(runtime(transport.clone()));

        let json = serde_json::json!({
            "update_id": 6,
            "edited_message": {
                "message_id": 3,
                "date": 1700000000i64,
                "edit_date": 1700000001i64,
                "chat": { "id": 42, "type": "private", "first_name": "Test" },
                "from": { "id": 42, "is_bot": false, "first_name": "Test" },
                "text": "edited",
            },
        });
        let update: Update = serde_json::from_str(&json.to_string()).unwrap();

        let result = handler.dispatch(dptree::deps![update]).await;

        assert!(matches!(result, ControlFlow::Break(Ok(()))));
        assert!(transport.delivered.lock().await.is_empty());
    }
}
