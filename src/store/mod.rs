//! Record store abstraction
//!
//! A record store persists the mapping from conversation to its ordered list of
//! movie entries. The watchlist service is written against this trait only, so the
//! JSON file, PostgreSQL and in-memory backends are interchangeable.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::{Config, StorageBackend},
    error::StoreResult,
    models::{ConversationId, MovieEntry, Watchlists},
};

pub mod json_file;
pub mod memory;
pub mod postgres;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Trait for watchlist persistence backends
///
/// `save` must leave the previously saved state intact if it fails part way:
/// the last successful save wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Loads every watchlist
    async fn load(&self) -> StoreResult<Watchlists>;

    /// Replaces every watchlist with `watchlists`
    async fn save(&self, watchlists: &Watchlists) -> StoreResult<()>;

    /// Loads a single conversation's watchlist, empty if it has none.
    ///
    /// Default implementation loads the whole mapping.
    async fn load_conversation(&self, chat: ConversationId) -> StoreResult<Vec<MovieEntry>> {
        let mut all = self.load().await?;
        Ok(all.remove(&chat).unwrap_or_default())
    }

    /// Replaces a single conversation's watchlist. An empty list drops the key.
    ///
    /// Default implementation is a load-modify-save of the whole mapping and is
    /// not safe against concurrent writers; backends shared between conversations
    /// override it.
    async fn save_conversation(
        &self,
        chat: ConversationId,
        entries: &[MovieEntry],
    ) -> StoreResult<()> {
        let mut all = self.load().await?;
        if entries.is_empty() {
            all.remove(&chat);
        } else {
            all.insert(chat, entries.to_vec());
        }
        self.save(&all).await
    }

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Builds the record store selected in the configuration
pub async fn from_config(config: &Config) -> anyhow::Result<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.storage {
        StorageBackend::File => Arc::new(JsonFileStore::new(&config.movies_file)),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Postgres => {
            let database_url = config.database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("DATABASE_URL is required when STORAGE=postgres")
            })?;
            Arc::new(PostgresStore::connect(database_url).await?)
        }
    };

    tracing::info!(backend = store.name(), "Record store ready");

    Ok(store)
}
