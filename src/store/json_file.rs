//! JSON file record store
//!
//! The whole mapping lives in a single pretty-printed JSON object:
//!
//! ```json
//! { "42": [ { "id": 1, "url": "http://a", "watched": false } ] }
//! ```
//!
//! Saves go to a sibling temp file which is synced and renamed over the target,
//! so a crash mid-save leaves the previous file in place.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};

use crate::{
    error::{StoreError, StoreResult},
    models::{ConversationId, MovieEntry, Watchlists},
    store::RecordStore,
};

/// On-disk document: conversation ids are object keys, so they are strings
type FileDocument = BTreeMap<String, Vec<MovieEntry>>;

pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes load-modify-save cycles across conversations
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "movies.json".to_string());
        self.path.with_file_name(format!("{}.tmp", file_name))
    }

    async fn read_document(&self) -> StoreResult<Watchlists> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Movies file missing, starting empty");
                return Ok(Watchlists::new());
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Watchlists::new());
        }

        let document: FileDocument = serde_json::from_slice(&bytes)?;

        document
            .into_iter()
            .map(|(key, entries)| {
                key.parse::<ConversationId>()
                    .map(|chat| (chat, entries))
                    .map_err(|_| StoreError::InvalidKey(key))
            })
            .collect()
    }

    async fn write_document(&self, watchlists: &Watchlists) -> StoreResult<()> {
        let document: FileDocument = watchlists
            .iter()
            .map(|(chat, entries)| (chat.to_string(), entries.clone()))
            .collect();
        let json = serde_json::to_vec_pretty(&document)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;

        tracing::debug!(
            path = %self.path.display(),
            conversations = watchlists.len(),
            "Movies file written"
        );

        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load(&self) -> StoreResult<Watchlists> {
        self.read_document().await
    }

    async fn save(&self, watchlists: &Watchlists) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write_document(watchlists).await
    }

    async fn save_conversation(
        &self,
        chat: ConversationId,
        entries: &[MovieEntry],
    ) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut all = self.read_document().await?;
        if entries.is_empty() {
            all.remove(&chat);
        } else {
            all.insert(chat, entries.to_vec());
        }

        self.write_document(&all).await
    }

    fn name(&self) -> &'static str {
        "json_file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("movies.json"))
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_layout_uses_string_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .save_conversation(ConversationId(42), &[MovieEntry::new(1, "http://a")])
            .await
            .unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "42": [ { "id": 1, "url": "http://a", "watched": false } ] })
        );
        assert!(!dir.path().join("movies.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_of_load_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut second = MovieEntry::new(2, "https://b");
        second.watched = true;
        store
            .save_conversation(ConversationId(-5), &[MovieEntry::new(1, "http://a"), second])
            .await
            .unwrap();
        store
            .save_conversation(ConversationId(42), &[MovieEntry::new(1, "http://c")])
            .await
            .unwrap();

        let before = std::fs::read(store.path()).unwrap();
        let loaded = store.load().await.unwrap();
        store.save(&loaded).await.unwrap();
        let after = std::fs::read(store.path()).unwrap();

        assert_eq!(before, after);
        assert_eq!(store.load().await.unwrap(), loaded);
    }

    #[tokio::test]
    async fn test_conversations_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .save_conversation(ConversationId(1), &[MovieEntry::new(1, "http://a")])
            .await
            .unwrap();
        store
            .save_conversation(ConversationId(2), &[MovieEntry::new(1, "http://b")])
            .await
            .unwrap();
        store.save_conversation(ConversationId(1), &[]).await.unwrap();

        let all = store.load().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[&ConversationId(2)][0].url, "http://b");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not json").unwrap();

        let result = store.load().await;
        assert!(matches!(result, Err(StoreError::Parse(_))));
    }

    #[tokio::test]
    async fn test_non_numeric_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"chat": []}"#).unwrap();

        let result = store.load().await;
        assert!(matches!(result, Err(StoreError::InvalidKey(key)) if key == "chat"));
    }

    #[tokio::test]
    async fn test_write_failure_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save_conversation(ConversationId(1), &[MovieEntry::new(1, "http://a")])
            .await
            .unwrap();

        // A directory in place of the temp file makes the next save fail
        std::fs::create_dir(dir.path().join("movies.json.tmp")).unwrap();
        let result = store
            .save_conversation(ConversationId(1), &[MovieEntry::new(2, "http://b")])
            .await;
        assert!(matches!(result, Err(StoreError::Io(_))));

        let entries = store.load_conversation(ConversationId(1)).await.unwrap();
        assert_eq!(entries, vec![MovieEntry::new(1, "http://a")]);
    }
}
