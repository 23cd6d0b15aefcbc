use common::{Candle, CandleSeries, Direction};
use proptest::prelude::*;
use strategy::{BodyExpansion, PatternDetector};

const H4: i64 = 4 * 60 * 60 * 1000;
const T0: i64 = 1_704_067_200_000;

/// (open, close, upper wick, lower wick) -> well-formed candle at slot `i`.
fn build(i: usize, (open, close, up, down): (f64, f64, f64, f64)) -> Candle {
    Candle {
        open_time: T0 + i as i64 * H4,
        open,
        high: open.max(close) + up,
        low: open.min(close) - down,
        close,
        volume: None,
    }
}

fn raw_candle() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (1.0f64..10_000.0, 1.0f64..10_000.0, 0.0f64..100.0, 0.0f64..100.0)
}

proptest! {
    /// Candles older than the newest three never change the outcome.
    #[test]
    fn evaluation_ignores_history_outside_window(
        history in prop::collection::vec(raw_candle(), 0..20),
        replacement in prop::collection::vec(raw_candle(), 0..20),
        window in prop::collection::vec(raw_candle(), 3),
    ) {
        let detector = BodyExpansion::new();

        let series_a = {
            let mut raw = history.clone();
            raw.extend(window.iter().copied());
            CandleSeries::new(raw.into_iter().enumerate().map(|(i, r)| build(i, r)).collect())
        };
        let series_b = {
            // Different length and content before the window; the window keeps
            // the same prices but shifts in time.
            let mut raw = replacement.clone();
            raw.reverse();
            raw.extend(window.iter().copied());
            CandleSeries::new(raw.into_iter().enumerate().map(|(i, r)| build(i, r)).collect())
        };

        let a = detector.evaluate("TESTUSDT", &series_a).unwrap();
        let b = detector.evaluate("TESTUSDT", &series_b).unwrap();

        prop_assert_eq!(a.is_some(), b.is_some());
        if let (Some(a), Some(b)) = (a, b) {
            prop_assert_eq!(a.direction, b.direction);
            prop_assert_eq!(a.entry_price, b.entry_price);
            prop_assert_eq!(a.stop_loss, b.stop_loss);
            prop_assert_eq!(a.take_profit, b.take_profit);
            prop_assert_eq!(a.reference_bodies, b.reference_bodies);
        }
    }

    /// Stop and target always sit on opposite sides of the entry.
    #[test]
    fn levels_bracket_entry(window in prop::collection::vec(raw_candle(), 3)) {
        let series = CandleSeries::new(
            window.into_iter().enumerate().map(|(i, r)| build(i, r)).collect(),
        );
        if let Some(signal) = BodyExpansion::new().evaluate("TESTUSDT", &series).unwrap() {
            let [prev2, prev1, current] = signal.reference_bodies;
            prop_assert!(current > prev1 && current > prev2);
            match signal.direction {
                Direction::Long => {
                    prop_assert!(signal.stop_loss <= signal.entry_price);
                    prop_assert!(signal.take_profit >= signal.entry_price);
                }
                Direction::Short => {
                    prop_assert!(signal.stop_loss >= signal.entry_price);
                    prop_assert!(signal.take_profit <= signal.entry_price);
                }
            }
        }
    }
}
