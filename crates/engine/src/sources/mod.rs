pub mod binance;
pub mod bybit;
pub mod coingecko;

pub use binance::BinanceSource;
pub use bybit::BybitSource;
pub use coingecko::CoinGeckoSource;

use reqwest::Client;

use common::{CandleSource, SourceKind, SourceSpec};

/// Instantiate the configured adapters in fallback order, all sharing `http`.
pub fn build_sources(specs: &[SourceSpec], http: &Client) -> Vec<Box<dyn CandleSource>> {
    specs
        .iter()
        .map(|spec| -> Box<dyn CandleSource> {
            let base_url = spec.base_url();
            match spec.kind {
                SourceKind::Binance | SourceKind::BinanceVision => Box::new(BinanceSource::new(
                    spec.kind.to_string(),
                    base_url,
                    http.clone(),
                )),
                SourceKind::Bybit => Box::new(BybitSource::new(base_url, http.clone())),
                SourceKind::CoinGecko => Box::new(CoinGeckoSource::new(base_url, http.clone())),
            }
        })
        .collect()
}
