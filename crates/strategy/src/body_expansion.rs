use common::{Candle, CandleSeries, Direction, Error, Result, Signal};
use tracing::debug;

use crate::{PatternDetector, MIN_CANDLES};

/// Take-profit distance as a fraction of the entry-to-stop risk.
pub const REWARD_RATIO: f64 = 0.5;

/// The three most recent closed candles, oldest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyWindow {
    pub prev2: Candle,
    pub prev1: Candle,
    pub current: Candle,
}

impl BodyWindow {
    /// Take the newest three candles of `series`.
    pub fn from_series(symbol: &str, series: &CandleSeries) -> Result<Self> {
        match series.candles() {
            [.., prev2, prev1, current] => Ok(Self {
                prev2: *prev2,
                prev1: *prev1,
                current: *current,
            }),
            _ => Err(Error::InsufficientData {
                symbol: symbol.to_string(),
                got: series.len(),
                needed: MIN_CANDLES,
            }),
        }
    }

    /// Bodies of `prev2`, `prev1` and `current`.
    pub fn bodies(&self) -> [f64; 3] {
        [self.prev2.body(), self.prev1.body(), self.current.body()]
    }

    /// The current body is strictly larger than both earlier bodies.
    pub fn is_expansion(&self) -> bool {
        let [prev2, prev1, current] = self.bodies();
        current > prev1 && current > prev2
    }
}

/// Fires when the latest closed candle's body outgrows both of the two
/// candles before it. Entry is the close, the stop sits at the far wick and
/// the target is `REWARD_RATIO` times the risk away from entry.
#[derive(Debug, Clone, Default)]
pub struct BodyExpansion;

impl BodyExpansion {
    pub fn new() -> Self {
        Self
    }

    fn build_signal(symbol: &str, window: &BodyWindow) -> Signal {
        let candle = window.current;
        let entry = candle.close;

        // A doji falls through to Short.
        let (direction, stop, take_profit) = if candle.is_bullish() {
            let risk = entry - candle.low;
            (Direction::Long, candle.low, entry + REWARD_RATIO * risk)
        } else {
            let risk = candle.high - entry;
            (Direction::Short, candle.high, entry - REWARD_RATIO * risk)
        };

        Signal {
            symbol: symbol.to_string(),
            direction,
            entry_price: entry,
            stop_loss: stop,
            take_profit,
            trigger_candle: candle,
            reference_bodies: window.bodies(),
        }
    }
}

impl PatternDetector for BodyExpansion {
    fn name(&self) -> &str {
        "body-expansion"
    }

    fn evaluate(&self, symbol: &str, series: &CandleSeries) -> Result<Option<Signal>> {
        let window = BodyWindow::from_series(symbol, series)?;
        if !window.is_expansion() {
            let [prev2, prev1, current] = window.bodies();
            debug!(symbol, prev2, prev1, current, "Body not large enough");
            return Ok(None);
        }
        Ok(Some(Self::build_signal(symbol, &window)))
    }
}
