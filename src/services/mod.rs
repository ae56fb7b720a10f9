pub mod watchlist;

pub use watchlist::WatchlistService;
