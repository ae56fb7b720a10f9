//! Telegram bot that keeps a per-chat watchlist of movie links.
//!
//! Watchlists live behind the [`store::RecordStore`] trait (JSON file, PostgreSQL or
//! memory) and are manipulated through [`services::WatchlistService`]. The [`bot`]
//! module turns Telegram updates into watchlist operations; [`api`] exposes the
//! webhook and status endpoints.

pub mod api;
pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;
pub mod store;
