use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use common::{Candle, CandleSeries, CandleSource, Error, Result, Timeframe};

use crate::http::{get_body, json_f64, json_i64};

/// Spot klines from Binance's `/api/v3/klines`.
///
/// The same adapter serves the main API host and the public market-data
/// mirror; only the base URL and display name differ.
pub struct BinanceSource {
    name: String,
    base_url: String,
    http: Client,
}

impl BinanceSource {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http: Client) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[async_trait]
impl CandleSource for BinanceSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<CandleSeries> {
        // One extra row covers the candle that is still forming.
        let limit = (count + 1).to_string();
        let url = format!("{}/api/v3/klines", self.base_url);

        debug!(provider = %self.name, symbol, limit = %limit, "Requesting klines");
        let request = self.http.get(&url).query(&[
            ("symbol", symbol),
            ("interval", timeframe.binance_interval()),
            ("limit", limit.as_str()),
        ]);
        let body = get_body(&self.name, request).await?;

        parse_klines(&self.name, &body, timeframe, Utc::now().timestamp_millis())
            .map(|series| series.keep_last(count))
    }
}

/// Parse a klines payload and keep the rows whose `closeTime` is before
/// `now_ms`.
///
/// Each row is `[openTime, open, high, low, close, volume, closeTime, ...]`
/// with prices encoded as decimal strings.
pub(crate) fn parse_klines(
    provider: &str,
    body: &str,
    timeframe: Timeframe,
    now_ms: i64,
) -> Result<CandleSeries> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| Error::unavailable(provider, format!("malformed klines payload: {e}")))?;

    let mut candles = Vec::with_capacity(rows.len());
    for row in &rows {
        let (candle, close_time) = parse_row(row).ok_or_else(|| {
            Error::unavailable(provider, format!("unexpected kline row: {row:?}"))
        })?;
        if !timeframe.is_aligned(candle.open_time) {
            return Err(Error::unavailable(
                provider,
                format!("kline open time {} is off the {timeframe} grid", candle.open_time),
            ));
        }
        if close_time < now_ms {
            candles.push(candle);
        }
    }

    Ok(CandleSeries::from_unordered(candles))
}

fn parse_row(row: &[Value]) -> Option<(Candle, i64)> {
    if row.len() < 7 {
        return None;
    }
    let candle = Candle {
        open_time: json_i64(&row[0])?,
        open: json_f64(&row[1])?,
        high: json_f64(&row[2])?,
        low: json_f64(&row[3])?,
        close: json_f64(&row[4])?,
        volume: json_f64(&row[5]),
    };
    candle
        .is_well_formed()
        .then_some((candle, json_i64(&row[6])?))
}
