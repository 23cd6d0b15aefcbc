pub mod aggregator;
pub mod alert;
pub mod chain;
pub mod http;
pub mod runner;
pub mod sources;

pub use aggregator::{Aggregator, PriceSample};
pub use chain::{SourceChain, MIN_USABLE_CANDLES};
pub use runner::{Runner, ScanReport, ScanSettings, SymbolOutcome};
pub use sources::{build_sources, BinanceSource, BybitSource, CoinGeckoSource};
