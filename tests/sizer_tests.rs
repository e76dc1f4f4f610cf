//! Tests for Kelly position sizing and portfolio allocation.

use crossbook::config::SizerConfig;
use crossbook::sizer::{KellySizer, SizingRequest};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn seed_history(sizer: &KellySizer, key: &str, wins: usize, losses: usize) {
    for _ in 0..wins {
        sizer.record_outcome(key, dec!(100), dec!(1000));
    }
    for _ in 0..losses {
        sizer.record_outcome(key, dec!(-50), dec!(1000));
    }
}

#[test]
fn thin_history_gets_conservative_default() {
    let sizer = KellySizer::new(SizerConfig::default());
    seed_history(&sizer, "spatial:BTC", 5, 4); // 9 samples, below the minimum of 10

    let sized = sizer.size("spatial:BTC", dec!(0.02), 0.3, dec!(10000), 0.02);

    // available * max_position_fraction / 2
    assert_eq!(sized, dec!(100));
}

#[test]
fn one_sided_history_gets_conservative_default() {
    let sizer = KellySizer::new(SizerConfig::default());
    // Twelve wins, no losses: payoff ratio is undefined.
    seed_history(&sizer, "spatial:BTC", 12, 0);

    let sized = sizer.size("spatial:BTC", dec!(0.02), 0.3, dec!(10000), 0.02);
    assert_eq!(sized, dec!(100));
}

#[test]
fn kelly_chain_produces_expected_fraction() {
    let sizer = KellySizer::new(SizerConfig::default());
    // win_rate 0.6, avg_win 100, avg_loss 50: raw f = (2*0.6 - 0.4)/2 = 0.4
    seed_history(&sizer, "spatial:BTC", 6, 4);

    let sized = sizer.size("spatial:BTC", dec!(0.02), 0.3, dec!(10000), 0.25);

    // 0.4 * (1 - 0.15) * 0.8 spatial * 0.9 volatility = 0.2448
    let expected = 10000.0 * 0.2448;
    let got = sized.to_f64().unwrap();
    assert!(
        (got - expected).abs() < 0.01,
        "expected ~{expected}, got {got}"
    );
    assert!(got <= 10000.0 * 0.25);
}

#[test]
fn hard_cap_bounds_strong_edges() {
    let sizer = KellySizer::new(SizerConfig::default());
    // Overwhelming edge: nine large wins to one tiny loss.
    for _ in 0..18 {
        sizer.record_outcome("funding_rate:BTC", dec!(1000), dec!(1000));
    }
    for _ in 0..2 {
        sizer.record_outcome("funding_rate:BTC", dec!(-1), dec!(1000));
    }

    let sized = sizer.size("funding_rate:BTC", dec!(0.05), 0.0, dec!(10000), 0.5);

    // Whatever the raw edge, the hard cap holds the fraction at 0.25.
    assert_eq!(sized.to_f64().unwrap(), 2500.0);
}

#[test]
fn negative_edge_sizes_to_zero() {
    let sizer = KellySizer::new(SizerConfig::default());
    for _ in 0..4 {
        sizer.record_outcome("statistical:X", dec!(50), dec!(1000));
    }
    for _ in 0..6 {
        sizer.record_outcome("statistical:X", dec!(-100), dec!(1000));
    }

    let sized = sizer.size("statistical:X", dec!(0.01), 0.0, dec!(10000), 0.25);
    assert_eq!(sized, Decimal::ZERO);
}

#[test]
fn novel_strategy_kinds_size_smaller() {
    let sizer = KellySizer::new(SizerConfig::default());
    seed_history(&sizer, "spatial:X", 6, 4);
    seed_history(&sizer, "cross_chain:X", 6, 4);

    let spatial = sizer.size("spatial:X", dec!(0.02), 0.3, dec!(10000), 0.25);
    let cross_chain = sizer.size("cross_chain:X", dec!(0.02), 0.3, dec!(10000), 0.25);

    assert!(cross_chain < spatial);
}

#[test]
fn volatility_signal_shrinks_sizing() {
    let sizer = KellySizer::new(SizerConfig::default());
    seed_history(&sizer, "spatial:X", 6, 4);

    let calm = sizer.size("spatial:X", dec!(0.02), 0.3, dec!(10000), 0.25);
    sizer.set_volatility_factor(0.5);
    let stressed = sizer.size("spatial:X", dec!(0.02), 0.3, dec!(10000), 0.25);

    assert!(stressed < calm);
}

#[test]
fn portfolio_allocation_is_deterministic() {
    let sizer = KellySizer::new(SizerConfig::default());
    let requests = vec![
        SizingRequest {
            opportunity_id: Uuid::new_v4(),
            strategy_key: "spatial:A".into(),
            expected_profit: dec!(100),
            risk_score: 0.1,
        },
        SizingRequest {
            opportunity_id: Uuid::new_v4(),
            strategy_key: "spatial:B".into(),
            expected_profit: dec!(50),
            risk_score: 0.1,
        },
        SizingRequest {
            opportunity_id: Uuid::new_v4(),
            strategy_key: "spatial:C".into(),
            expected_profit: dec!(10),
            risk_score: 0.5,
        },
    ];

    let first = sizer.allocate_portfolio(&requests, dec!(10000));
    let second = sizer.allocate_portfolio(&requests, dec!(10000));

    assert_eq!(first, second);
}

#[test]
fn portfolio_allocation_ranks_by_profit_per_risk() {
    let sizer = KellySizer::new(SizerConfig::default());
    let best = Uuid::new_v4();
    let middle = Uuid::new_v4();
    let worst = Uuid::new_v4();
    let requests = vec![
        SizingRequest {
            opportunity_id: worst,
            strategy_key: "spatial:C".into(),
            expected_profit: dec!(10),
            risk_score: 0.5,
        },
        SizingRequest {
            opportunity_id: best,
            strategy_key: "spatial:A".into(),
            expected_profit: dec!(100),
            risk_score: 0.1,
        },
        SizingRequest {
            opportunity_id: middle,
            strategy_key: "spatial:B".into(),
            expected_profit: dec!(50),
            risk_score: 0.1,
        },
    ];

    // With no history every request sizes to 1% of the remaining capital,
    // so the allocation order shows up in the granted amounts.
    let allocations = sizer.allocate_portfolio(&requests, dec!(10000));

    let best_amount = allocations[&best].to_f64().unwrap();
    let middle_amount = allocations[&middle].to_f64().unwrap();
    let worst_amount = allocations[&worst].to_f64().unwrap();

    assert!((best_amount - 100.0).abs() < 1e-6);
    assert!((middle_amount - 99.0).abs() < 1e-6);
    assert!((worst_amount - 98.01).abs() < 1e-6);

    let total: f64 = allocations.values().map(|a| a.to_f64().unwrap()).sum();
    assert!(total <= 10000.0);
}
