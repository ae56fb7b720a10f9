use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::error::StoreResult;

/// Creates a PostgreSQL connection pool
///
/// The bot handles one update at a time per conversation, so a small pool is enough.
pub async fn create_pool(database_url: &str) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations (creates the `movies` table and its index)
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
