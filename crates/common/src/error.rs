use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// One provider call failed (network, HTTP status, payload). The
    /// fallback chain recovers from this by moving to the next source.
    #[error("Source {provider} unavailable: {reason}")]
    SourceUnavailable { provider: String, reason: String },

    #[error("All {attempts} candle sources exhausted for {symbol}")]
    AllSourcesExhausted { symbol: String, attempts: usize },

    #[error("Insufficient data for {symbol}: got {got} closed candles, need {needed}")]
    InsufficientData {
        symbol: String,
        got: usize,
        needed: usize,
    },

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn unavailable(provider: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::SourceUnavailable {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
