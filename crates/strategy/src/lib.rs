pub mod body_expansion;

pub use body_expansion::{BodyExpansion, BodyWindow, REWARD_RATIO};

use common::{CandleSeries, Result, Signal};

/// Fewest closed candles any detector needs.
pub const MIN_CANDLES: usize = 3;

/// Candlestick pattern evaluated on closed candles.
pub trait PatternDetector: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Evaluate the series and optionally emit a signal.
    ///
    /// Fails with `Error::InsufficientData` when the series is too short.
    /// Returns `Ok(None)` when the pattern is absent.
    fn evaluate(&self, symbol: &str, series: &CandleSeries) -> Result<Option<Signal>>;
}
