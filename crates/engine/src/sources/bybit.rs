use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Candle, CandleSeries, CandleSource, Error, Result, Timeframe};

/// Spot klines from Bybit's v5 `/v5/market/kline`.
pub struct BybitSource {
    base_url: String,
    http: Client,
}

impl BybitSource {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[async_trait]
impl CandleSource for BybitSource {
    fn name(&self) -> &str {
        "bybit"
    }

    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<CandleSeries> {
        let limit = (count + 1).to_string();
        let url = format!("{}/v5/market/kline", self.base_url);

        debug!(provider = "bybit", symbol, limit = %limit, "Requesting klines");
        let request = self.http.get(&url).query(&[
            ("category", "spot"),
            ("symbol", symbol),
            ("interval", timeframe.bybit_interval()),
            ("limit", limit.as_str()),
        ]);
        let body = crate::http::get_body(self.name(), request).await?;

        parse_kline_response(&body, timeframe, Utc::now().timestamp_millis())
            .map(|series| series.keep_last(count))
    }
}

/// Parse a v5 kline response. Rows arrive newest first as
/// `[startTime, open, high, low, close, volume, turnover]` strings.
pub(crate) fn parse_kline_response(
    body: &str,
    timeframe: Timeframe,
    now_ms: i64,
) -> Result<CandleSeries> {
    let resp: KlineResponse = serde_json::from_str(body)
        .map_err(|e| Error::unavailable("bybit", format!("malformed kline payload: {e}")))?;

    // Bybit reports errors with HTTP 200 and a non-zero retCode.
    if resp.ret_code != 0 {
        return Err(Error::unavailable(
            "bybit",
            format!("retCode {}: {}", resp.ret_code, resp.ret_msg),
        ));
    }

    let list = resp.result.map(|r| r.list).unwrap_or_default();
    let candles = list
        .iter()
        .map(|row| {
            parse_row(row).ok_or_else(|| {
                Error::unavailable("bybit", format!("unexpected kline row: {row:?}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(bad) = candles.iter().find(|c| !timeframe.is_aligned(c.open_time)) {
        return Err(Error::unavailable(
            "bybit",
            format!("kline start {} is off the {timeframe} grid", bad.open_time),
        ));
    }

    Ok(CandleSeries::from_unordered(candles).closed_at(timeframe, now_ms))
}

fn parse_row(row: &[String]) -> Option<Candle> {
    if row.len() < 6 {
        return None;
    }
    let candle = Candle {
        open_time: row[0].parse().ok()?,
        open: row[1].parse().ok()?,
        high: row[2].parse().ok()?,
        low: row[3].parse().ok()?,
        close: row[4].parse().ok()?,
        volume: row[5].parse().ok(),
    };
    candle.is_well_formed().then_some(candle)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KlineResponse {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    result: Option<KlineResult>,
}

#[derive(Deserialize)]
struct KlineResult {
    #[serde(default)]
    list: Vec<Vec<String>>,
}
