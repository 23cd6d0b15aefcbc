use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Candle granularity the scanner works on.
///
/// Only four-hour candles are supported. Bucket boundaries fall on
/// 00, 04, 08, 12, 16 and 20 o'clock UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "4h")]
    H4,
}

impl Timeframe {
    /// Length of one candle in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        match self {
            Timeframe::H4 => 4 * 60 * 60 * 1000,
        }
    }

    /// Start of the bucket containing `ts_ms`.
    ///
    /// The epoch starts on a day boundary and four hours divide a day, so
    /// flooring against the epoch lands on the UTC 4H grid.
    pub fn bucket_start(&self, ts_ms: i64) -> i64 {
        ts_ms - ts_ms.rem_euclid(self.duration_ms())
    }

    /// Last millisecond belonging to the candle that opens at `open_time`.
    pub fn close_time(&self, open_time: i64) -> i64 {
        open_time + self.duration_ms() - 1
    }

    pub fn is_aligned(&self, ts_ms: i64) -> bool {
        ts_ms.rem_euclid(self.duration_ms()) == 0
    }

    /// Interval code understood by the Binance klines endpoint.
    pub fn binance_interval(&self) -> &'static str {
        match self {
            Timeframe::H4 => "4h",
        }
    }

    /// Interval code understood by the Bybit v5 kline endpoint (minutes).
    pub fn bybit_interval(&self) -> &'static str {
        match self {
            Timeframe::H4 => "240",
        }
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "4h" => Ok(Timeframe::H4),
            other => Err(Error::Config(format!(
                "unsupported timeframe '{other}', only '4h' is available"
            ))),
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeframe::H4 => write!(f, "4h"),
        }
    }
}

/// One OHLC record. `open_time` is epoch milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Candle {
    /// Absolute distance between open and close.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Strictly green. A doji is not bullish.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// True when the wick bounds enclose the body.
    pub fn is_well_formed(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }
}

/// Closed candles for one symbol, oldest first, unique open times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Wrap candles that are already ascending and deduplicated.
    pub fn new(candles: Vec<Candle>) -> Self {
        debug_assert!(
            candles.windows(2).all(|w| w[0].open_time < w[1].open_time),
            "candle series must be strictly increasing by open_time"
        );
        Self { candles }
    }

    /// Sort by open time and drop repeated boundaries, keeping the first seen.
    pub fn from_unordered(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.open_time);
        candles.dedup_by_key(|c| c.open_time);
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Keep only the newest `count` candles.
    pub fn keep_last(mut self, count: usize) -> Self {
        if self.candles.len() > count {
            self.candles.drain(..self.candles.len() - count);
        }
        self
    }

    /// Drop every candle whose period has not fully elapsed at `now_ms`.
    pub fn closed_at(mut self, timeframe: Timeframe, now_ms: i64) -> Self {
        self.candles
            .retain(|c| timeframe.close_time(c.open_time) < now_ms);
        self
    }

    pub fn into_vec(self) -> Vec<Candle> {
        self.candles
    }
}

/// Trade direction suggested by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Candle colour that produced this direction.
    pub fn colour(&self) -> &'static str {
        match self {
            Direction::Long => "GREEN",
            Direction::Short => "RED",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Trade suggestion produced by the pattern detector.
///
/// `reference_bodies` holds the bodies of the two preceding candles and the
/// trigger candle, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub trigger_candle: Candle,
    pub reference_bodies: [f64; 3],
}

impl Signal {
    /// Distance between entry and stop.
    pub fn risk(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs()
    }
}
