use tracing::debug;

use common::{Candle, CandleSeries, Timeframe};

/// One raw price observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    pub ts_ms: i64,
    pub price: f64,
}

impl PriceSample {
    pub fn new(ts_ms: i64, price: f64) -> Self {
        Self { ts_ms, price }
    }
}

/// Folds time-ordered price samples into candles on the timeframe's UTC grid.
///
/// A bucket is emitted only once a sample from a later bucket shows up, so the
/// bucket still accumulating when input ends is never returned. Windows with
/// no samples are left out rather than synthesized.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    timeframe: Timeframe,
}

impl Aggregator {
    pub fn new(timeframe: Timeframe) -> Self {
        Self { timeframe }
    }

    /// `samples` must be ascending by time; they are not sorted here.
    pub fn aggregate(&self, samples: &[PriceSample]) -> CandleSeries {
        let mut closed = Vec::new();
        let mut forming: Option<Candle> = None;

        for sample in samples {
            let bucket = self.timeframe.bucket_start(sample.ts_ms);
            if let Some(candle) = forming.as_mut() {
                if bucket == candle.open_time {
                    candle.high = candle.high.max(sample.price);
                    candle.low = candle.low.min(sample.price);
                    candle.close = sample.price;
                    continue;
                }
                if bucket < candle.open_time {
                    debug!(ts_ms = sample.ts_ms, "Skipping out-of-order price sample");
                    continue;
                }
            }
            if let Some(done) = forming.replace(open_bucket(bucket, sample.price)) {
                closed.push(done);
            }
        }

        CandleSeries::new(closed)
    }
}

fn open_bucket(open_time: i64, price: f64) -> Candle {
    Candle {
        open_time,
        open: price,
        high: price,
        low: price,
        close: price,
        volume: None,
    }
}
