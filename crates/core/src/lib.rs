#![warn(clippy::all, missing_docs)]

//! Core domain logic for the duotui terminal client.
//!
//! This crate hosts the data models, configuration handling,
//! and the listing fetch/refresh layer used by the terminal UI
//! and any future frontends.

pub mod config;
pub mod listing;
pub mod models;

pub use config::AppConfig;
pub use listing::{ListingClient, ListingError, ListingRefresher, RefreshEvent};
pub use models::{AdDraft, GameSummary, RefreshState, WeekDay};
