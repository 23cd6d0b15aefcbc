use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{CandleSeries, CandleSource, Error, Result, Timeframe};

use crate::aggregator::{Aggregator, PriceSample};

/// Hours in a day, used to size the `days` window.
const HOURS_PER_DAY: usize = 24;

/// Below two days CoinGecko switches to five-minute points.
const MIN_DAYS: usize = 2;

/// Quote suffixes stripped from a trading pair to find the base asset.
const QUOTE_SUFFIXES: [&str; 4] = ["USDT", "USDC", "BUSD", "USD"];

/// Hourly prices from CoinGecko's `market_chart`, aggregated locally.
///
/// CoinGecko has no exchange candles, so the leading bucket (whose samples
/// may start mid-window) is discarded and the rest comes from the
/// `Aggregator`, which already leaves out the bucket still forming.
pub struct CoinGeckoSource {
    base_url: String,
    http: Client,
}

impl CoinGeckoSource {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[async_trait]
impl CandleSource for CoinGeckoSource {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<CandleSeries> {
        let coin = coin_id(symbol).ok_or_else(|| {
            Error::unavailable(self.name(), format!("no coin id mapped for {symbol}"))
        })?;
        let days = days_for(timeframe, count).to_string();
        let url = format!("{}/api/v3/coins/{coin}/market_chart", self.base_url);

        debug!(provider = "coingecko", symbol, coin, days = %days, "Requesting market chart");
        let request = self
            .http
            .get(&url)
            .query(&[("vs_currency", "usd"), ("days", days.as_str())]);
        let body = crate::http::get_body(self.name(), request).await?;

        let samples = parse_market_chart(&body)?;
        Ok(candles_from_samples(timeframe, &samples, count))
    }
}

/// Map a trading pair such as `BTCUSDT` to a CoinGecko coin id.
pub fn coin_id(symbol: &str) -> Option<&'static str> {
    let symbol = symbol.to_uppercase();
    let base = QUOTE_SUFFIXES
        .iter()
        .find_map(|quote| symbol.strip_suffix(quote))
        .unwrap_or(&symbol);

    let id = match base {
        "BTC" => "bitcoin",
        "ETH" => "ethereum",
        "SOL" => "solana",
        "LTC" => "litecoin",
        "BNB" => "binancecoin",
        "XRP" => "ripple",
        "ADA" => "cardano",
        "DOGE" => "dogecoin",
        _ => return None,
    };
    Some(id)
}

/// Days of history covering `count` candles plus the leading and the
/// forming bucket.
fn days_for(timeframe: Timeframe, count: usize) -> usize {
    let hours_per_candle = (timeframe.duration_ms() / (60 * 60 * 1000)) as usize;
    let hours = (count + 2) * hours_per_candle;
    hours.div_ceil(HOURS_PER_DAY).max(MIN_DAYS)
}

pub(crate) fn parse_market_chart(body: &str) -> Result<Vec<PriceSample>> {
    let chart: MarketChart = serde_json::from_str(body).map_err(|e| {
        Error::unavailable("coingecko", format!("malformed market chart payload: {e}"))
    })?;

    Ok(chart
        .prices
        .into_iter()
        .map(|(ts, price)| PriceSample::new(ts as i64, price))
        .collect())
}

/// Aggregate samples, drop the leading bucket and keep the newest `count`.
///
/// The forming bucket is excluded by the aggregator alone; no second drop is
/// applied at the tail.
pub(crate) fn candles_from_samples(
    timeframe: Timeframe,
    samples: &[PriceSample],
    count: usize,
) -> CandleSeries {
    let mut candles = Aggregator::new(timeframe).aggregate(samples).into_vec();
    if !candles.is_empty() {
        candles.remove(0);
    }
    CandleSeries::new(candles).keep_last(count)
}

#[derive(Deserialize)]
struct MarketChart {
    prices: Vec<(f64, f64)>,
}
