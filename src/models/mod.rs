pub mod watchlist;

pub use watchlist::{ConversationId, MovieEntry, MovieId, WatchlistStats, Watchlists};
