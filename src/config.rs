use serde::Deserialize;

/// Which record store backs the watchlists
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Single JSON file (`MOVIES_FILE`)
    File,
    /// PostgreSQL (`DATABASE_URL`)
    Postgres,
    /// Process memory, lost on restart
    Memory,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Telegram bot token
    pub bot_token: String,

    /// Record store backend
    #[serde(default = "default_storage")]
    pub storage: StorageBackend,

    /// Path of the JSON file used by the file backend
    #[serde(default = "default_movies_file")]
    pub movies_file: String,

    /// PostgreSQL database connection URL, required by the postgres backend
    pub database_url: Option<String>,

    /// Redis connection URL. When set, conversation modes are kept in Redis.
    pub redis_url: Option<String>,

    /// How long a pending conversation mode stays valid
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Public base URL of this service. When set, updates arrive via webhook.
    pub public_url: Option<String>,

    /// Public URL injected by Render, used when `PUBLIC_URL` is not set
    pub render_external_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_storage() -> StorageBackend {
    StorageBackend::File
}

fn default_movies_file() -> String {
    "movies.json".to_string()
}

fn default_session_ttl_secs() -> u64 {
    900
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN cannot be empty");
        }
        if self.storage == StorageBackend::Postgres && self.database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORAGE=postgres");
        }
        Ok(())
    }

    /// Webhook URL Telegram should post updates to, if webhook mode is configured
    pub fn webhook_url(&self) -> anyhow::Result<Option<url::Url>> {
        let base = self
            .public_url
            .as_deref()
            .or(self.render_external_url.as_deref())
            .map(str::trim)
            .filter(|base| !base.is_empty());

        let Some(base) = base else {
            return Ok(None);
        };

        let url = url::Url::parse(&format!(
            "{}/webhook/{}",
            base.trim_end_matches('/'),
            self.bot_token
        ))?;

        Ok(Some(url))
    }
}
