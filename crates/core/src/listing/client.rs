//! HTTP access to the listing server.

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::{config::AppConfig, models::GameSummary};

/// Failures surfaced by a listing fetch.
///
/// Callers treat both variants identically (log and keep the previous
/// listing); the split only keeps log lines precise.
#[derive(Debug, Error)]
pub enum ListingError {
    /// The request could not be completed at the transport level.
    #[error("request to listing server failed: {0}")]
    Http(#[source] reqwest::Error),
    /// The response body was not a valid game listing.
    #[error("listing response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Thin wrapper over [`reqwest::Client`] bound to the configured server.
#[derive(Debug, Clone)]
pub struct ListingClient {
    http: Client,
    base_url: String,
}

impl ListingClient {
    /// Create a client for the configured listing server.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.server_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the games collection endpoint.
    pub fn games_url(&self) -> String {
        format!("{}/games", self.base_url)
    }

    /// Fetch the current game listing.
    pub async fn fetch_games(&self) -> Result<Vec<GameSummary>, ListingError> {
        let url = self.games_url();
        debug!(%url, "fetching game listing");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(ListingError::Http)?;

        response.json().await.map_err(ListingError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn games_url_joins_base() {
        let config = AppConfig::default();
        let client = ListingClient::new(&config);
        assert_eq!(client.games_url(), "http://localhost:3333/games");
    }

    #[test]
    fn games_url_tolerates_trailing_slash() {
        let config = AppConfig {
            server_url: "http://duo.example.org/".to_string(),
            ..AppConfig::default()
        };
        let client = ListingClient::new(&config);
        assert_eq!(client.games_url(), "http://duo.example.org/games");
    }
}
