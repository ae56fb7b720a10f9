use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use crate::{
    db,
    error::StoreResult,
    models::{ConversationId, MovieEntry, Watchlists},
    store::RecordStore,
};

/// PostgreSQL record store
///
/// One row per movie entry. The per-conversation `id` is stored explicitly next to the
/// serial `row_id`, so ids are assigned exactly like the file backend and listing
/// order follows `row_id` (insertion order).
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and applies migrations
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = db::create_pool(database_url).await?;
        db::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Makes the rows of `chat` match `entries`: removes rows that are gone, upserts
    /// the rest. A row is identified by its id and url together, so an id reused
    /// for another link becomes a fresh row. Rows that survive keep their `row_id`
    /// and `created_at`.
    async fn replace_conversation(
        conn: &mut PgConnection,
        chat: ConversationId,
        entries: &[MovieEntry],
    ) -> StoreResult<()> {
        let ids: Vec<i64> = entries.iter().map(|e| e.id as i64).collect();
        let urls: Vec<String> = entries.iter().map(|e| e.url.clone()).collect();

        sqlx::query(
            r#"
            DELETE FROM movies
            WHERE chat_id = $1
              AND (id, url) NOT IN (SELECT * FROM UNNEST($2::BIGINT[], $3::TEXT[]))
            "#,
        )
        .bind(chat.0)
        .bind(&ids[..])
        .bind(&urls[..])
        .execute(&mut *conn)
        .await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO movies (chat_id, id, url, watched)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (chat_id, id)
                DO UPDATE SET watched = EXCLUDED.watched
                "#,
            )
            .bind(chat.0)
            .bind(entry.id as i64)
            .bind(&entry.url)
            .bind(entry.watched)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn load(&self) -> StoreResult<Watchlists> {
        let rows = sqlx::query_as::<_, (i64, i64, String, bool)>(
            "SELECT chat_id, id, url, watched FROM movies ORDER BY row_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut watchlists = Watchlists::new();
        for (chat_id, id, url, watched) in rows {
            watchlists
                .entry(ConversationId(chat_id))
                .or_default()
                .push(MovieEntry {
                    id: id as u64,
                    url,
                    watched,
                });
        }

        Ok(watchlists)
    }

    async fn save(&self, watchlists: &Watchlists) -> StoreResult<()> {
        let chats: Vec<i64> = watchlists.keys().map(|chat| chat.0).collect();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM movies WHERE NOT (chat_id = ANY($1))")
            .bind(&chats[..])
            .execute(&mut *tx)
            .await?;

        for (chat, entries) in watchlists {
            Self::replace_conversation(&mut *tx, *chat, entries).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_conversation(&self, chat: ConversationId) -> StoreResult<Vec<MovieEntry>> {
        let rows = sqlx::query_as::<_, (i64, String, bool)>(
            "SELECT id, url, watched FROM movies WHERE chat_id = $1 ORDER BY row_id",
        )
        .bind(chat.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, url, watched)| MovieEntry {
                id: id as u64,
                url,
                watched,
            })
            .collect())
    }

    async fn save_conversation(
        &self,
        chat: ConversationId,
        entries: &[MovieEntry],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::replace_conversation(&mut *tx, chat, entries).await?;
        tx.commit().await?;

        tracing::debug!(chat_id = %chat, entries = entries.len(), "Conversation rows saved");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
