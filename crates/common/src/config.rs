use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result, Timeframe};

const DEFAULT_SYMBOLS: &str = "BTCUSDT,ETHUSDT,SOLUSDT,LTCUSDT";
const DEFAULT_SOURCES: &str = "binance,binance-vision,bybit,coingecko";

/// Upstream provider adapters that can appear in the fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Binance spot klines on the main API host.
    Binance,
    /// Binance public market-data mirror, same payload as `Binance`.
    BinanceVision,
    Bybit,
    /// Hourly prices aggregated locally into 4H candles.
    #[serde(rename = "coingecko")]
    CoinGecko,
}

impl SourceKind {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            SourceKind::Binance => "https://api.binance.com",
            SourceKind::BinanceVision => "https://data-api.binance.vision",
            SourceKind::Bybit => "https://api.bybit.com",
            SourceKind::CoinGecko => "https://api.coingecko.com",
        }
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(SourceKind::Binance),
            "binance-vision" => Ok(SourceKind::BinanceVision),
            "bybit" => Ok(SourceKind::Bybit),
            "coingecko" => Ok(SourceKind::CoinGecko),
            other => Err(Error::Config(format!("unknown candle source '{other}'"))),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Binance => write!(f, "binance"),
            SourceKind::BinanceVision => write!(f, "binance-vision"),
            SourceKind::Bybit => write!(f, "bybit"),
            SourceKind::CoinGecko => write!(f, "coingecko"),
        }
    }
}

/// One entry of the ordered source list. `base_url` overrides the
/// provider's default host, e.g. to point at a regional mirror.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceSpec {
    pub kind: SourceKind,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl SourceSpec {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            base_url: None,
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }
}

/// Optional TOML file overriding the symbol list and source order.
///
/// Example `config/scan.toml`:
/// ```toml
/// symbols = ["BTCUSDT", "ETHUSDT"]
///
/// [[source]]
/// kind = "binance-vision"
///
/// [[source]]
/// kind = "coingecko"
/// base_url = "https://pro-api.coingecko.com"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanFileConfig {
    #[serde(default)]
    pub symbols: Option<Vec<String>>,
    #[serde(rename = "source", default)]
    pub sources: Option<Vec<SourceSpec>>,
}

impl ScanFileConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse scan config at '{path}': {e}")))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Everything one scan needs, resolved once at startup.
///
/// Credentials have no built-in fallback: a missing Telegram token or chat id
/// is a configuration error.
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_token: String,
    pub telegram_chat_id: String,

    // Scan
    pub symbols: Vec<String>,
    pub timeframe: Timeframe,
    pub sources: Vec<SourceSpec>,

    // Pacing
    pub http_timeout: Duration,
    pub symbol_delay: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    Error::Config(format!(
                        "required environment variable '{key}' is not set"
                    ))
                })
        };

        let file = match lookup("SCAN_CONFIG_PATH") {
            Some(path) if !path.trim().is_empty() => {
                debug!(path = %path, "Loading scan config file");
                ScanFileConfig::load(path.trim())?
            }
            _ => ScanFileConfig::default(),
        };

        let symbols = match file.symbols {
            Some(symbols) => symbols
                .into_iter()
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => split_list(&lookup("SCAN_SYMBOLS").unwrap_or_else(|| DEFAULT_SYMBOLS.into()))
                .map(|s| s.to_uppercase())
                .collect::<Vec<_>>(),
        };
        if symbols.is_empty() {
            return Err(Error::Config("symbol list is empty".into()));
        }

        let sources = match file.sources {
            Some(sources) => sources,
            None => split_list(&lookup("CANDLE_SOURCES").unwrap_or_else(|| DEFAULT_SOURCES.into()))
                .map(|s| s.parse().map(SourceSpec::new))
                .collect::<Result<Vec<_>>>()?,
        };
        if sources.is_empty() {
            return Err(Error::Config("candle source list is empty".into()));
        }

        let timeframe = match lookup("SCAN_TIMEFRAME") {
            Some(tf) => tf.parse()?,
            None => Timeframe::H4,
        };

        Ok(Config {
            telegram_token: required("TELEGRAM_TOKEN")?,
            telegram_chat_id: required("TELEGRAM_CHAT_ID")?,
            symbols,
            timeframe,
            sources,
            http_timeout: Duration::from_secs(parse_or(&lookup, "HTTP_TIMEOUT_SECS", 10)?),
            symbol_delay: Duration::from_millis(parse_or(&lookup, "SYMBOL_DELAY_MS", 500)?),
        })
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_or<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            Error::Config(format!("'{key}' must be a non-negative integer, got '{raw}'"))
        }),
        None => Ok(default),
    }
}
