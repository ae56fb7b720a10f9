use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures of the backing medium of a record store.
///
/// Every variant means the store is unavailable: reads degrade to an empty
/// watchlist, writes must not be reported as successful.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data is corrupt: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid conversation key in stored data: {0}")]
    InvalidKey(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by watchlist operations
#[derive(thiserror::Error, Debug)]
pub enum WatchlistError {
    #[error("Not a link: {0:?}")]
    InvalidUrl(String),

    #[error("Already in the watchlist: {0}")]
    Duplicate(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Errors delivering replies through the chat transport
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("Telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
