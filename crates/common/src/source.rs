use async_trait::async_trait;

use crate::{CandleSeries, Result, Timeframe};

/// One upstream market-data provider.
///
/// Implementations only return candles whose period has fully elapsed, in
/// ascending order, at most `count` of them. A short history is reported
/// through the series length. Transport, status and payload failures are
/// `Error::SourceUnavailable`; retrying is left to the caller.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Provider name used in logs and errors.
    fn name(&self) -> &str;

    async fn fetch(&self, symbol: &str, timeframe: Timeframe, count: usize)
        -> Result<CandleSeries>;
}
