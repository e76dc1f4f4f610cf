//! Tests for book aggregation under concurrent venue feeds.

use std::sync::Arc;

use chrono::{Duration, Utc};
use crossbook::aggregator::BookAggregator;
use crossbook::config::AggregatorConfig;
use crossbook::domain::{InstrumentId, OrderBook, PriceLevel, VenueId};
use crossbook::error::BookError;
use crossbook::testkit::domain::{book, book_at, instrument, venue};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Barrier;

#[test]
fn violating_snapshot_cannot_be_constructed() {
    // Bids ascending instead of descending.
    let result = OrderBook::try_new(
        VenueId::from("kraken"),
        InstrumentId::from("BTC-USDT"),
        vec![
            PriceLevel::new(dec!(99), dec!(1)),
            PriceLevel::new(dec!(100), dec!(1)),
        ],
        vec![],
        Utc::now(),
    );
    assert!(matches!(result, Err(BookError::MisorderedBids { .. })));

    // Zero-quantity level mixed into otherwise valid depth.
    let result = OrderBook::try_new(
        VenueId::from("kraken"),
        InstrumentId::from("BTC-USDT"),
        vec![],
        vec![
            PriceLevel::new(dec!(100), dec!(1)),
            PriceLevel::new(dec!(101), dec!(0)),
        ],
        Utc::now(),
    );
    assert!(matches!(result, Err(BookError::InvalidLevel { index: 1, .. })));
}

#[test]
fn out_of_order_update_is_a_noop() {
    let agg = BookAggregator::new(AggregatorConfig::default());
    let t0 = Utc::now();

    agg.update(book_at(
        "kraken",
        "BTC-USDT",
        &[(dec!(100), dec!(2))],
        &[(dec!(101), dec!(2))],
        t0,
    ))
    .unwrap();

    let result = agg.update(book_at(
        "kraken",
        "BTC-USDT",
        &[(dec!(42), dec!(1))],
        &[],
        t0 - Duration::seconds(2),
    ));
    assert!(result.is_err());

    let snap = agg.snapshot(&instrument("BTC-USDT"));
    let held = &snap[&venue("kraken")];
    assert_eq!(held.best_bid().unwrap().price(), dec!(100));
    assert_eq!(held.best_ask().unwrap().price(), dec!(101));
}

#[test]
fn stale_venues_are_excluded_not_served() {
    let agg = BookAggregator::new(AggregatorConfig {
        staleness_window_secs: 5,
        ..Default::default()
    });

    agg.update(book_at(
        "kraken",
        "BTC-USDT",
        &[(dec!(100), dec!(2))],
        &[],
        Utc::now() - Duration::seconds(30),
    ))
    .unwrap();
    agg.update(book("binance", "BTC-USDT", &[(dec!(101), dec!(2))], &[]))
        .unwrap();

    let snap = agg.snapshot(&instrument("BTC-USDT"));
    assert_eq!(snap.len(), 1);
    assert!(snap.contains_key(&venue("binance")));
    assert!(!snap.contains_key(&venue("kraken")));
}

/// Interleaved writers on disjoint (venue, instrument) keys must never
/// corrupt each other's snapshots.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_on_disjoint_keys_do_not_corrupt() {
    const WRITERS: usize = 8;
    const ROUNDS: i64 = 50;

    let agg = Arc::new(BookAggregator::new(AggregatorConfig::default()));
    let barrier = Arc::new(Barrier::new(WRITERS));

    let mut handles = Vec::new();
    for writer in 0..WRITERS {
        let agg = agg.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let venue_name = format!("venue-{writer}");
            // Several writers share an instrument through distinct venues.
            let instrument_name = format!("inst-{}", writer % 4);
            let start = Utc::now();
            let price = Decimal::from(100 + writer as i64);

            for round in 0..ROUNDS {
                let quantity = Decimal::from(round + 1);
                agg.update(book_at(
                    &venue_name,
                    &instrument_name,
                    &[(price, quantity)],
                    &[(price + Decimal::ONE, quantity)],
                    start + Duration::milliseconds(round),
                ))
                .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Every writer's last snapshot survives fully formed.
    for writer in 0..WRITERS {
        let snap = agg.snapshot(&instrument(&format!("inst-{}", writer % 4)));
        let held = &snap[&venue(&format!("venue-{writer}"))];
        let price = Decimal::from(100 + writer as i64);

        assert_eq!(held.best_bid().unwrap().price(), price);
        assert_eq!(held.best_ask().unwrap().price(), price + Decimal::ONE);
        assert_eq!(held.best_bid().unwrap().quantity(), Decimal::from(ROUNDS));
    }
}

#[tokio::test]
async fn update_notifications_reach_subscribers() {
    let (agg, mut rx) = BookAggregator::with_notifications(AggregatorConfig::default());

    agg.update(book(
        "kraken",
        "BTC-USDT",
        &[(dec!(100), dec!(1))],
        &[(dec!(101), dec!(1))],
    ))
    .unwrap();

    let update = rx.recv().await.unwrap();
    assert_eq!(update.venue, venue("kraken"));
    assert_eq!(update.instrument, instrument("BTC-USDT"));
}
