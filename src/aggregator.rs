//! Thread-safe order-book aggregation across venues.
//!
//! The aggregator is the single piece of shared mutable state in the core.
//! Venue feeds push whole snapshots through [`BookAggregator::update`];
//! consumers read consistent per-instrument views through
//! [`BookAggregator::snapshot`]. Entries are sharded by instrument so
//! feeds for unrelated instruments never contend on one lock.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::warn;

use crate::config::AggregatorConfig;
use crate::domain::{InstrumentId, OrderBook, VenueId};
use crate::error::{BookError, Result};

/// Notification sent when a book is updated.
#[derive(Debug, Clone)]
pub struct BookUpdate {
    /// The venue whose book changed.
    pub venue: VenueId,
    /// The instrument that was updated.
    pub instrument: InstrumentId,
}

/// Thread-safe store of the latest order book per (venue, instrument).
pub struct BookAggregator {
    books: DashMap<InstrumentId, HashMap<VenueId, OrderBook>>,
    staleness_window: Duration,
    /// Broadcast sender for update notifications.
    /// Wrapped in Option to allow construction without notifications.
    tx: Option<broadcast::Sender<BookUpdate>>,
}

impl BookAggregator {
    /// Create an aggregator without update notifications.
    #[must_use]
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            books: DashMap::new(),
            staleness_window: Duration::seconds(config.staleness_window_secs as i64),
            tx: None,
        }
    }

    /// Create an aggregator with broadcast notifications.
    ///
    /// Returns the aggregator and a receiver for subscribing to updates.
    /// Additional receivers can be created via `subscribe()`.
    #[must_use]
    pub fn with_notifications(config: AggregatorConfig) -> (Self, broadcast::Receiver<BookUpdate>) {
        let (tx, rx) = broadcast::channel(config.notify_capacity);
        let aggregator = Self {
            books: DashMap::new(),
            staleness_window: Duration::seconds(config.staleness_window_secs as i64),
            tx: Some(tx),
        };
        (aggregator, rx)
    }

    /// Subscribe to book update notifications.
    ///
    /// Returns `None` if the aggregator was created without notifications.
    #[must_use]
    pub fn subscribe(&self) -> Option<broadcast::Receiver<BookUpdate>> {
        self.tx.as_ref().map(|tx| tx.subscribe())
    }

    /// Apply a validated snapshot, replacing the held book wholesale.
    ///
    /// A snapshot older than the one currently held for the same
    /// (venue, instrument) is dropped and the prior state retained.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::StaleSnapshot`] for an out-of-order update.
    pub fn update(&self, book: OrderBook) -> Result<()> {
        let venue = book.venue().clone();
        let instrument = book.instrument().clone();

        {
            let mut venues = self.books.entry(instrument.clone()).or_default();
            if let Some(held) = venues.get(&venue) {
                if book.observed_at() < held.observed_at() {
                    warn!(
                        venue = %venue,
                        instrument = %instrument,
                        held = %held.observed_at(),
                        offered = %book.observed_at(),
                        "Dropping out-of-order book snapshot"
                    );
                    return Err(BookError::StaleSnapshot {
                        venue,
                        instrument,
                        held: held.observed_at(),
                        offered: book.observed_at(),
                    }
                    .into());
                }
            }
            venues.insert(venue.clone(), book);
        }

        if let Some(ref tx) = self.tx {
            let _ = tx.send(BookUpdate { venue, instrument });
        }
        Ok(())
    }

    /// Latest known book per venue for an instrument.
    ///
    /// Venues with no update inside the staleness window are excluded
    /// rather than returned with stale data, so downstream detection never
    /// acts on dead liquidity.
    #[must_use]
    pub fn snapshot(&self, instrument: &InstrumentId) -> HashMap<VenueId, OrderBook> {
        let cutoff = Utc::now() - self.staleness_window;
        self.books
            .get(instrument)
            .map(|venues| {
                venues
                    .iter()
                    .filter(|(_, book)| book.observed_at() >= cutoff)
                    .map(|(venue, book)| (venue.clone(), book.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Instruments with at least one held book, fresh or stale.
    #[must_use]
    pub fn instruments(&self) -> Vec<InstrumentId> {
        let mut instruments: Vec<InstrumentId> =
            self.books.iter().map(|entry| entry.key().clone()).collect();
        instruments.sort();
        instruments
    }

    /// Drop books outside the staleness window.
    ///
    /// Returns the number of books removed.
    pub fn prune(&self) -> usize {
        let cutoff = Utc::now() - self.staleness_window;
        let mut removed = 0;
        for mut entry in self.books.iter_mut() {
            let before = entry.len();
            entry.retain(|_, book| book.observed_at() >= cutoff);
            removed += before - entry.len();
        }
        self.books.retain(|_, venues| !venues.is_empty());
        removed
    }

    /// Number of held books across all instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.books.iter().map(|entry| entry.len()).sum()
    }

    /// Returns true if no book is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
