use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use common::{MessageFormat, Notifier, Result, Signal, Timeframe};
use strategy::{BodyWindow, PatternDetector, MIN_CANDLES};

use crate::alert::{format_alert, format_time};
use crate::chain::SourceChain;

/// What happened to one symbol during a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    /// Pattern found. `notified` is false when delivery failed.
    Signal { signal: Signal, notified: bool },
    /// Candles were evaluated and the pattern was absent.
    NoSignal { bodies: [f64; 3] },
    /// The symbol could not be evaluated this cycle.
    Skipped { reason: String },
}

/// Per-symbol outcomes of one scan, in scan order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub outcomes: Vec<(String, SymbolOutcome)>,
}

impl ScanReport {
    pub fn alerts_sent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, SymbolOutcome::Signal { notified: true, .. }))
            .count()
    }

    pub fn signals(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, SymbolOutcome::Signal { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, SymbolOutcome::Skipped { .. }))
            .count()
    }

    pub fn outcome(&self, symbol: &str) -> Option<&SymbolOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, o)| o)
    }
}

/// Scan settings that are not collaborators.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub symbols: Vec<String>,
    pub timeframe: Timeframe,
    /// Pause between two symbols, to stay under upstream rate limits.
    pub symbol_delay: Duration,
    /// Where the notifier delivers alerts (a chat id for Telegram).
    pub destination: String,
}

/// Runs one scan: every symbol goes through the source chain and the
/// detector, and any signal is sent to the notifier.
///
/// Failures are contained per symbol; a scan always completes.
pub struct Runner {
    settings: ScanSettings,
    chain: SourceChain,
    detector: Box<dyn PatternDetector>,
    notifier: Arc<dyn Notifier>,
}

impl Runner {
    pub fn new(
        settings: ScanSettings,
        chain: SourceChain,
        detector: Box<dyn PatternDetector>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            chain,
            detector,
            notifier,
        }
    }

    pub async fn run(&self) -> ScanReport {
        info!(
            symbols = ?self.settings.symbols,
            timeframe = %self.settings.timeframe,
            sources = ?self.chain.names(),
            detector = self.detector.name(),
            "Scan starting"
        );

        let mut report = ScanReport::default();
        for (i, symbol) in self.settings.symbols.iter().enumerate() {
            if i > 0 && !self.settings.symbol_delay.is_zero() {
                tokio::time::sleep(self.settings.symbol_delay).await;
            }

            let outcome = match self.check_symbol(symbol).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Symbol skipped");
                    SymbolOutcome::Skipped {
                        reason: e.to_string(),
                    }
                }
            };
            report.outcomes.push((symbol.clone(), outcome));
        }

        info!(
            checked = report.outcomes.len(),
            signals = report.signals(),
            alerts_sent = report.alerts_sent(),
            skipped = report.skipped(),
            "Scan complete"
        );
        report
    }

    async fn check_symbol(&self, symbol: &str) -> Result<SymbolOutcome> {
        let timeframe = self.settings.timeframe;
        let series = self.chain.fetch(symbol, timeframe, MIN_CANDLES).await?;

        let window = BodyWindow::from_series(symbol, &series)?;
        let [prev2, prev1, current] = window.bodies();
        let describe = |body: f64, open_time: i64| format!("{body:.2} @ {}", format_time(open_time));
        let (older, previous, latest) = (
            describe(prev2, window.prev2.open_time),
            describe(prev1, window.prev1.open_time),
            describe(current, window.current.open_time),
        );
        info!(
            symbol,
            prev2 = %older,
            prev1 = %previous,
            current = %latest,
            "Comparing candle bodies"
        );

        let Some(signal) = self.detector.evaluate(symbol, &series)? else {
            info!(
                symbol,
                "No signal: {current:.2} > {prev1:.2} && {current:.2} > {prev2:.2} is false"
            );
            return Ok(SymbolOutcome::NoSignal {
                bodies: [prev2, prev1, current],
            });
        };

        info!(
            symbol,
            direction = %signal.direction,
            entry = signal.entry_price,
            stop = signal.stop_loss,
            target = signal.take_profit,
            "Signal found"
        );

        let text = format_alert(&signal, timeframe);
        let notified = match self
            .notifier
            .send(&self.settings.destination, &text, MessageFormat::Html)
            .await
        {
            Ok(()) => {
                info!(symbol, "Alert delivered");
                true
            }
            Err(e) => {
                error!(symbol, error = %e, "Alert delivery failed");
                false
            }
        };

        Ok(SymbolOutcome::Signal { signal, notified })
    }
}
