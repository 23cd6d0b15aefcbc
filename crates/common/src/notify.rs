use async_trait::async_trait;

use crate::Result;

/// Markup hint passed along with an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormat {
    #[default]
    Plain,
    Html,
}

/// Outbound message channel.
///
/// Any error is `Error::Notification`. Callers log it and carry on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, destination: &str, text: &str, format: MessageFormat) -> Result<()>;
}
