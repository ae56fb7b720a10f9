use std::sync::Arc;

use anyhow::Context;
use teloxide::prelude::*;
use tracing_subscriber::EnvFilter;

use movie_picker::{
    api::{create_router, AppState},
    bot::{polling, BotRuntime, Controller, TelegramTransport},
    config::Config,
    services::WatchlistService,
    session, store,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    tracing::info!("Starting movie picker v{}", env!("CARGO_PKG_VERSION"));

    let store = store::from_config(&config).await?;
    let sessions = session::from_config(&config)?;
    let watchlist = Arc::new(WatchlistService::new(store));
    let controller = Arc::new(Controller::new(watchlist, sessions));

    let bot = Bot::new(&config.bot_token);
    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let runtime = BotRuntime::new(controller, transport);

    let state = AppState::new(runtime.clone(), config.bot_token.as_str());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    tracing::info!(host = %config.host, port = config.port, "HTTP server listening");

    match config.webhook_url()? {
        Some(webhook_url) => {
            bot.set_webhook(webhook_url).await?;
            tracing::info!("Webhook registered, waiting for updates");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        None => {
            tracing::warn!("PUBLIC_URL is not set, falling back to long polling");

            // Keep /health reachable for the hosting platform while polling
            let server = tokio::spawn(async move { axum::serve(listener, app).await });
            polling::run_polling(bot, runtime, shutdown_signal()).await;
            server.abort();
        }
    }

    tracing::info!("Shut down cleanly");
    Ok(())
}

/// Initializes the tracing subscriber, `RUST_LOG` overrides the default filter
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("movie_picker=info,tower_http=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
