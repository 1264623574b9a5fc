//! Listing retrieval and periodic refresh.

/// HTTP client for the games collection endpoint.
pub mod client;
/// Periodic background refresher feeding the UI.
pub mod refresh;

pub use client::{ListingClient, ListingError};
pub use refresh::{ListingRefresher, RefreshEvent};
