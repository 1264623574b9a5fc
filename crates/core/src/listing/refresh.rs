//! Periodic listing refresh task.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local};
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    listing::client::{ListingClient, ListingError},
    models::GameSummary,
};

/// Events emitted by the periodic listing refresher.
#[derive(Debug)]
pub enum RefreshEvent {
    /// A fetch completed with a decoded listing.
    Loaded {
        /// Issue sequence number of the fetch that produced this event.
        seq: u64,
        /// Decoded listing, in server response order.
        games: Vec<GameSummary>,
        /// Local completion time, shown as "last updated".
        fetched_at: DateTime<Local>,
    },
    /// A fetch failed; the previous listing stays in effect.
    Failed {
        /// Issue sequence number of the fetch that produced this event.
        seq: u64,
        /// What went wrong.
        error: ListingError,
    },
}

impl RefreshEvent {
    /// Issue sequence number of the fetch behind this event.
    pub fn seq(&self) -> u64 {
        match self {
            RefreshEvent::Loaded { seq, .. } | RefreshEvent::Failed { seq, .. } => *seq,
        }
    }
}

/// Periodically fetches the game listing and forwards completions to
/// the UI over a channel.
pub struct ListingRefresher {
    client: ListingClient,
    period: Duration,
}

impl ListingRefresher {
    /// Create a refresher using the given client and period.
    pub fn new(client: ListingClient, period: Duration) -> Self {
        Self { client, period }
    }

    /// Drive the refresh loop, sending events to the provided channel.
    ///
    /// The first fetch is issued immediately, then one per period.
    /// Fetches are spawned fire-and-forget so a slow response never
    /// delays the next tick; overlapping in-flight fetches are possible
    /// and each completion carries its issue sequence number so the
    /// receiver can discard out-of-order arrivals. A failed fetch is
    /// reported and the cadence continues unchanged.
    ///
    /// The loop ends when the receiving side of the channel is dropped.
    /// In-flight fetches are not cancelled at that point; their late
    /// sends are discarded with the channel.
    pub async fn run(self, sender: mpsc::Sender<RefreshEvent>) -> Result<()> {
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut seq: u64 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    seq += 1;
                    debug!(seq, "issuing listing fetch");
                    let client = self.client.clone();
                    let sender = sender.clone();
                    tokio::spawn(async move {
                        let event = match client.fetch_games().await {
                            Ok(games) => RefreshEvent::Loaded {
                                seq,
                                games,
                                fetched_at: Local::now(),
                            },
                            Err(error) => RefreshEvent::Failed { seq, error },
                        };
                        let _ = sender.send(event).await;
                    });
                }
                _ = sender.closed() => {
                    info!("listing refresh stopped");
                    break;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    // Nothing listens on the discard port, so every fetch fails fast;
    // the loop and its sequencing are what is under test here.
    fn refresher(period: Duration) -> ListingRefresher {
        let config = AppConfig {
            server_url: "http://127.0.0.1:9".to_string(),
            ..AppConfig::default()
        };
        ListingRefresher::new(ListingClient::new(&config), period)
    }

    #[tokio::test]
    async fn emits_sequenced_events_until_receiver_drops() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(refresher(Duration::from_millis(20)).run(tx));

        let first = rx.recv().await.expect("first completion");
        let second = rx.recv().await.expect("second completion");
        assert_eq!(first.seq(), 1);
        assert_eq!(second.seq(), 2);
        assert!(matches!(first, RefreshEvent::Failed { .. }));

        drop(rx);
        time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("refresher should stop once the receiver is gone")
            .expect("refresh task panicked")
            .expect("refresh loop errored");
    }

    #[tokio::test]
    async fn first_fetch_is_immediate() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(refresher(Duration::from_secs(3600)).run(tx));

        // With an hour-long period, any event we see must be the initial
        // fetch issued on activation.
        let event = time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("initial fetch should not wait for the first period")
            .expect("channel open");
        assert_eq!(event.seq(), 1);

        drop(rx);
        let _ = time::timeout(Duration::from_secs(2), handle).await;
    }
}
