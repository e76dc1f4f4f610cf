//! Tests for cross-venue spread detection and ranking.

use std::sync::Arc;

use chrono::{Duration, Utc};
use crossbook::aggregator::BookAggregator;
use crossbook::config::{AggregatorConfig, DetectorConfig};
use crossbook::detector::SpreadDetector;
use crossbook::domain::VenueDirectory;
use crossbook::testkit::domain::{book, book_at, instrument, venue};
use rust_decimal_macros::dec;

fn setup(config: DetectorConfig) -> (Arc<BookAggregator>, SpreadDetector) {
    let aggregator = Arc::new(BookAggregator::new(AggregatorConfig::default()));
    let detector = SpreadDetector::new(aggregator.clone(), Arc::new(VenueDirectory::new()), config);
    (aggregator, detector)
}

#[test]
fn profit_fraction_matches_hand_computed_value() {
    let (agg, detector) = setup(DetectorConfig::default());

    agg.update(book(
        "kraken",
        "BTC-USDT",
        &[(dec!(99), dec!(5))],
        &[(dec!(100), dec!(4))],
    ))
    .unwrap();
    agg.update(book(
        "binance",
        "BTC-USDT",
        &[(dec!(103), dec!(6))],
        &[(dec!(103.5), dec!(6))],
    ))
    .unwrap();

    let opportunities = detector.scan(&instrument("BTC-USDT"));
    assert_eq!(opportunities.len(), 1);

    let opp = &opportunities[0];
    assert_eq!(opp.buy_venue(), &venue("kraken"));
    assert_eq!(opp.sell_venue(), &venue("binance"));
    assert_eq!(opp.buy_price(), dec!(100));
    assert_eq!(opp.sell_price(), dec!(103));
    // (103 - 100) / 100
    assert_eq!(opp.profit_fraction(), dec!(0.03));
    // 3 spread * min(4, 6) tradable
    assert_eq!(opp.profit_notional_estimate(), dec!(12));
    assert_eq!(
        opp.expires_at() - opp.detected_at(),
        Duration::seconds(5)
    );
}

#[test]
fn spread_below_threshold_is_not_emitted() {
    let (agg, detector) = setup(DetectorConfig {
        min_profit_fraction: dec!(0.03),
        ..Default::default()
    });

    // Exactly at the threshold: must exceed, not meet.
    agg.update(book("kraken", "BTC-USDT", &[], &[(dec!(100), dec!(4))]))
        .unwrap();
    agg.update(book("binance", "BTC-USDT", &[(dec!(103), dec!(6))], &[]))
        .unwrap();

    assert!(detector.scan(&instrument("BTC-USDT")).is_empty());
}

#[test]
fn opportunities_ranked_by_profit_then_liquidity() {
    let (agg, detector) = setup(DetectorConfig::default());

    // Two buy venues and two sell venues quoting identical prices, so
    // every qualifying pair has the same profit fraction and only depth
    // separates them.
    agg.update(book("a", "ETH-USDT", &[], &[(dec!(100), dec!(1))]))
        .unwrap();
    agg.update(book("b", "ETH-USDT", &[(dec!(102), dec!(1))], &[]))
        .unwrap();
    agg.update(book("c", "ETH-USDT", &[], &[(dec!(100), dec!(10))]))
        .unwrap();
    agg.update(book("d", "ETH-USDT", &[(dec!(102), dec!(10))], &[]))
        .unwrap();

    let opportunities = detector.scan(&instrument("ETH-USDT"));
    assert_eq!(opportunities.len(), 4);

    // Deepest pair first, shallowest last.
    assert_eq!(opportunities[0].buy_venue(), &venue("c"));
    assert_eq!(opportunities[0].sell_venue(), &venue("d"));
    assert_eq!(opportunities[3].buy_venue(), &venue("a"));
    assert_eq!(opportunities[3].sell_venue(), &venue("b"));
}

#[test]
fn higher_profit_ranks_before_deeper_liquidity() {
    let (agg, detector) = setup(DetectorConfig::default());

    // Shallow 4% spread between a and b; deep 1% spread between c and d.
    // The cross combinations (a, d) and (c, b) also qualify but sit in
    // between, so profit alone decides the top and bottom of the ranking.
    agg.update(book("a", "ETH-USDT", &[], &[(dec!(100), dec!(1))]))
        .unwrap();
    agg.update(book("b", "ETH-USDT", &[(dec!(104), dec!(1))], &[]))
        .unwrap();
    agg.update(book("c", "ETH-USDT", &[], &[(dec!(102), dec!(50))]))
        .unwrap();
    agg.update(book("d", "ETH-USDT", &[(dec!(103.02), dec!(50))], &[]))
        .unwrap();

    let opportunities = detector.scan(&instrument("ETH-USDT"));
    assert_eq!(opportunities.len(), 4);

    // The shallow pair wins on profit despite fifty times less depth.
    assert_eq!(opportunities[0].buy_venue(), &venue("a"));
    assert_eq!(opportunities[0].sell_venue(), &venue("b"));
    assert_eq!(opportunities[0].profit_fraction(), dec!(0.04));

    // The deep pair's own spread ranks last.
    assert_eq!(opportunities[3].buy_venue(), &venue("c"));
    assert_eq!(opportunities[3].sell_venue(), &venue("d"));
    assert_eq!(opportunities[3].profit_fraction(), dec!(0.01));
}

#[test]
fn stale_venue_cannot_produce_opportunities() {
    let (agg, detector) = setup(DetectorConfig::default());

    agg.update(book("kraken", "BTC-USDT", &[], &[(dec!(100), dec!(4))]))
        .unwrap();
    // The rich bid is stale and must be invisible to the detector.
    agg.update(book_at(
        "binance",
        "BTC-USDT",
        &[(dec!(110), dec!(6))],
        &[],
        Utc::now() - Duration::seconds(60),
    ))
    .unwrap();

    assert!(detector.scan(&instrument("BTC-USDT")).is_empty());
}

#[test]
fn scan_all_covers_every_instrument() {
    let (agg, detector) = setup(DetectorConfig::default());

    agg.update(book("kraken", "BTC-USDT", &[], &[(dec!(100), dec!(4))]))
        .unwrap();
    agg.update(book("binance", "BTC-USDT", &[(dec!(103), dec!(6))], &[]))
        .unwrap();
    agg.update(book("kraken", "ETH-USDT", &[], &[(dec!(10), dec!(4))]))
        .unwrap();
    agg.update(book("binance", "ETH-USDT", &[(dec!(10.3), dec!(6))], &[]))
        .unwrap();

    let opportunities = detector.scan_all();
    assert_eq!(opportunities.len(), 2);
}
