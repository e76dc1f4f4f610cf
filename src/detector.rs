//! Cross-venue spread detection.
//!
//! Scans aggregated books for the same instrument priced differently
//! across venues. Every ordered (buy, sell) venue pair is checked, so a
//! dislocation is found regardless of which venue is rich; qualifying
//! spreads come back ranked best first.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::aggregator::BookAggregator;
use crate::config::DetectorConfig;
use crate::domain::{InstrumentId, Opportunity, OrderBook, VenueDirectory, Volume};

/// Detects spatial arbitrage opportunities from aggregated book state.
pub struct SpreadDetector {
    aggregator: Arc<BookAggregator>,
    venues: Arc<VenueDirectory>,
    config: DetectorConfig,
}

impl SpreadDetector {
    /// Create a detector reading from the given aggregator.
    #[must_use]
    pub fn new(
        aggregator: Arc<BookAggregator>,
        venues: Arc<VenueDirectory>,
        config: DetectorConfig,
    ) -> Self {
        Self {
            aggregator,
            venues,
            config,
        }
    }

    /// Scan one instrument for qualifying cross-venue spreads.
    ///
    /// Returns all qualifying opportunities ordered by profit fraction
    /// descending, ties broken by combined top-of-book liquidity
    /// descending. Downstream consumers choose how many to act on, which
    /// supports partial capital allocation across several opportunities.
    #[must_use]
    pub fn scan(&self, instrument: &InstrumentId) -> Vec<Opportunity> {
        let snapshot = self.aggregator.snapshot(instrument);
        let detected_at = Utc::now();
        let ttl = Duration::seconds(self.config.opportunity_ttl_secs as i64);

        // Sorted venue list keeps pair iteration deterministic.
        let mut venues: Vec<_> = snapshot.keys().cloned().collect();
        venues.sort();

        let mut ranked: Vec<(Opportunity, Volume)> = Vec::new();

        for buy_venue in &venues {
            for sell_venue in &venues {
                if buy_venue == sell_venue {
                    continue;
                }

                let buy_book = &snapshot[buy_venue];
                let sell_book = &snapshot[sell_venue];

                let (Some(ask), Some(bid)) = (buy_book.best_ask(), sell_book.best_bid()) else {
                    continue;
                };

                let spread = bid.price() - ask.price();
                if spread <= Decimal::ZERO {
                    continue;
                }

                let profit_fraction = spread / ask.price();
                if profit_fraction <= self.config.min_profit_fraction {
                    continue;
                }

                let tradable = ask.quantity().min(bid.quantity());
                let combined_liquidity = ask.quantity() + bid.quantity();
                let confidence = self.confidence(profit_fraction, tradable, buy_book, sell_book);

                let opportunity = Opportunity::new(
                    instrument.clone(),
                    buy_venue.clone(),
                    sell_venue.clone(),
                    ask.price(),
                    bid.price(),
                    tradable,
                    confidence,
                    detected_at,
                    ttl,
                );

                debug!(
                    instrument = %instrument,
                    buy_venue = %buy_venue,
                    sell_venue = %sell_venue,
                    profit_fraction = %profit_fraction,
                    confidence,
                    "Detected cross-venue spread"
                );

                ranked.push((opportunity, combined_liquidity));
            }
        }

        ranked.sort_by(|(a, liq_a), (b, liq_b)| {
            b.profit_fraction()
                .cmp(&a.profit_fraction())
                .then(liq_b.cmp(liq_a))
        });

        ranked.into_iter().map(|(opp, _)| opp).collect()
    }

    /// Scan every instrument the aggregator currently holds.
    #[must_use]
    pub fn scan_all(&self) -> Vec<Opportunity> {
        self.aggregator
            .instruments()
            .iter()
            .flat_map(|instrument| self.scan(instrument))
            .collect()
    }

    /// Confidence in [0, 1], monotone in profit and depth, inversely
    /// monotone in combined venue round-trip latency.
    fn confidence(
        &self,
        profit_fraction: Decimal,
        tradable: Volume,
        buy_book: &OrderBook,
        sell_book: &OrderBook,
    ) -> f64 {
        let policy = &self.config.confidence;

        let profit = profit_fraction.to_f64().unwrap_or(0.0);
        let depth = tradable.to_f64().unwrap_or(0.0);
        let round_trip = (self.venues.latency_ms(buy_book.venue())
            + self.venues.latency_ms(sell_book.venue())) as f64;

        let profit_factor = (profit / policy.profit_saturation).min(1.0);
        let depth_factor = (depth / policy.depth_saturation).min(1.0);
        let latency_factor = (1.0 - round_trip / policy.latency_scale_ms).max(policy.latency_floor);

        (policy.base * profit_factor * depth_factor * latency_factor).clamp(0.0, 1.0)
    }
}
