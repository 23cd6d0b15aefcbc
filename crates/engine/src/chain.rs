use tracing::{debug, info, warn};

use common::{CandleSeries, CandleSource, Error, Result, Timeframe};

/// A series shorter than this sends the chain on to the next source.
pub const MIN_USABLE_CANDLES: usize = strategy::MIN_CANDLES;

/// Ordered list of candle sources, most preferred first.
///
/// Sources are tried strictly in order. The first one that returns at least
/// `MIN_USABLE_CANDLES` closed candles wins and the rest are not called.
pub struct SourceChain {
    sources: Vec<Box<dyn CandleSource>>,
}

impl SourceChain {
    pub fn new(sources: Vec<Box<dyn CandleSource>>) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::Config("source chain needs at least one source".into()));
        }
        Ok(Self { sources })
    }

    /// Provider names in the order they are tried.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<CandleSeries> {
        for source in &self.sources {
            let provider = source.name();
            match source.fetch(symbol, timeframe, count).await {
                Ok(series) if series.len() >= MIN_USABLE_CANDLES => {
                    info!(symbol, provider, candles = series.len(), "Candles fetched");
                    return Ok(series);
                }
                Ok(series) => {
                    warn!(
                        symbol,
                        provider,
                        candles = series.len(),
                        "Too few closed candles, trying next source"
                    );
                }
                Err(e) => {
                    warn!(symbol, provider, error = %e, "Source failed, trying next source");
                }
            }
        }

        debug!(symbol, attempts = self.sources.len(), "Source chain exhausted");
        Err(Error::AllSourcesExhausted {
            symbol: symbol.to_string(),
            attempts: self.sources.len(),
        })
    }
}
