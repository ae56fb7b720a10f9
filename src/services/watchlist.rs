use std::sync::Arc;

use dashmap::DashMap;
use rand::seq::SliceRandom;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    error::WatchlistError,
    models::{ConversationId, MovieEntry, MovieId, WatchlistStats},
    store::RecordStore,
};

/// Watchlist operations for every conversation, backed by a [`RecordStore`].
///
/// Mutations run load-modify-save under a per-conversation lock and persist before
/// returning. Reads degrade to an empty watchlist when the store is unavailable;
/// writes surface the failure.
/// Lock table size above which idle per-conversation locks are dropped
const LOCK_PRUNE_THRESHOLD: usize = 1024;

pub struct WatchlistService {
    store: Arc<dyn RecordStore>,
    locks: DashMap<ConversationId, Arc<Mutex<()>>>,
}

impl WatchlistService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    /// Name of the backing store, for logging and the status banner
    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    async fn lock(&self, chat: ConversationId) -> OwnedMutexGuard<()> {
        if self.locks.len() > LOCK_PRUNE_THRESHOLD {
            // Holders and waiters keep a clone, so a count of 1 means idle
            self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }

        // Clone the Arc out so the DashMap shard is released before awaiting
        let lock = self.locks.entry(chat).or_default().clone();
        lock.lock_owned().await
    }

    /// Adds a movie link and returns its new id
    pub async fn add(&self, chat: ConversationId, url: &str) -> Result<MovieId, WatchlistError> {
        let url = url.trim();
        if !url.starts_with("http") {
            return Err(WatchlistError::InvalidUrl(url.to_string()));
        }

        let _guard = self.lock(chat).await;
        let mut entries = self.store.load_conversation(chat).await?;

        if entries.iter().any(|e| e.url == url) {
            tracing::debug!(chat_id = %chat, url = %url, "Duplicate movie rejected");
            return Err(WatchlistError::Duplicate(url.to_string()));
        }

        let id = next_id(&entries);
        entries.push(MovieEntry::new(id, url));
        self.store.save_conversation(chat, &entries).await?;

        tracing::info!(chat_id = %chat, movie_id = id, "Movie added");

        Ok(id)
    }

    /// Entries in insertion order, empty if none or if the store is unavailable
    pub async fn list(&self, chat: ConversationId) -> Vec<MovieEntry> {
        match self.store.load_conversation(chat).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(chat_id = %chat, error = %e, "Store unavailable, listing as empty");
                Vec::new()
            }
        }
    }

    pub async fn stats(&self, chat: ConversationId) -> WatchlistStats {
        WatchlistStats::from_entries(&self.list(chat).await)
    }

    /// Marks an entry watched. Returns whether the id exists; marking twice is a no-op.
    pub async fn mark_watched(
        &self,
        chat: ConversationId,
        id: MovieId,
    ) -> Result<bool, WatchlistError> {
        let _guard = self.lock(chat).await;
        let mut entries = self.store.load_conversation(chat).await?;

        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };

        if !entry.watched {
            entry.watched = true;
            self.store.save_conversation(chat, &entries).await?;
            tracing::info!(chat_id = %chat, movie_id = id, "Movie marked watched");
        }

        Ok(true)
    }

    /// Removes one entry. Returns whether it existed.
    pub async fn delete_by_id(
        &self,
        chat: ConversationId,
        id: MovieId,
    ) -> Result<bool, WatchlistError> {
        let _guard = self.lock(chat).await;
        let mut entries = self.store.load_conversation(chat).await?;

        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }

        self.store.save_conversation(chat, &entries).await?;
        tracing::info!(chat_id = %chat, movie_id = id, "Movie deleted");

        Ok(true)
    }

    /// Removes every watched entry and returns how many were removed
    pub async fn delete_watched(&self, chat: ConversationId) -> Result<usize, WatchlistError> {
        let _guard = self.lock(chat).await;
        let mut entries = self.store.load_conversation(chat).await?;

        let before = entries.len();
        entries.retain(|e| !e.watched);
        let removed = before - entries.len();

        if removed > 0 {
            self.store.save_conversation(chat, &entries).await?;
        }

        tracing::info!(chat_id = %chat, removed, "Watched movies deleted");

        Ok(removed)
    }

    /// Empties the conversation's watchlist
    pub async fn delete_all(&self, chat: ConversationId) -> Result<bool, WatchlistError> {
        let _guard = self.lock(chat).await;
        let entries = self.store.load_conversation(chat).await?;
        if entries.is_empty() {
            return Ok(true);
        }

        self.store.save_conversation(chat, &[]).await?;

        tracing::info!(chat_id = %chat, removed = entries.len(), "Watchlist cleared");

        Ok(true)
    }

    /// Picks one unwatched entry uniformly at random
    pub async fn pick_random_unwatched(&self, chat: ConversationId) -> Option<MovieEntry> {
        let entries = self.list(chat).await;
        let candidates: Vec<&MovieEntry> = entries.iter().filter(|e| !e.watched).collect();

        candidates.choose(&mut rand::thread_rng()).map(|e| (*e).clone())
    }
}

/// Next id for a watchlist: one past the largest id, or 1 when empty
pub fn next_id(entries: &[MovieEntry]) -> MovieId {
    entries.iter().map(|e| e.id).max().unwrap_or(0) + 1
}
