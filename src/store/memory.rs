use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::StoreResult,
    models::{ConversationId, MovieEntry, Watchlists},
    store::RecordStore,
};

/// Process-local record store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Watchlists>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self) -> StoreResult<Watchlists> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, watchlists: &Watchlists) -> StoreResult<()> {
        *self.inner.write().await = watchlists.clone();
        Ok(())
    }

    async fn load_conversation(&self, chat: ConversationId) -> StoreResult<Vec<MovieEntry>> {
        Ok(self.inner.read().await.get(&chat).cloned().unwrap_or_default())
    }

    async fn save_conversation(
        &self,
        chat: ConversationId,
        entries: &[MovieEntry],
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if entries.is_empty() {
            inner.remove(&chat);
        } else {
            inner.insert(chat, entries.to_vec());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
