pub mod config;
pub mod error;
pub mod notify;
pub mod source;
pub mod types;

pub use config::{Config, SourceKind, SourceSpec};
pub use error::{Error, Result};
pub use notify::{MessageFormat, Notifier};
pub use source::CandleSource;
pub use types::*;
