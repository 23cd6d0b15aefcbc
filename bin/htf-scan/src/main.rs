use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::Config;
use engine::{build_sources, http::build_client, Runner, ScanSettings, SourceChain};
use strategy::BodyExpansion;
use telegram_notify::TelegramNotifier;

/// Runs a single scan and exits. Scheduling is left to cron or a CI timer.
///
/// Only setup failures produce a non-zero exit code; per-symbol failures are
/// logged and the scan still finishes.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("failed to load configuration")?;
    info!(
        symbols = ?cfg.symbols,
        timeframe = %cfg.timeframe,
        timeout = ?cfg.http_timeout,
        delay = ?cfg.symbol_delay,
        "HTF scanner starting"
    );

    // ── Candle sources ───────────────────────────────────────────────────────
    let http = build_client(cfg.http_timeout)?;
    let chain = SourceChain::new(build_sources(&cfg.sources, &http))?;

    // ── Notifier ──────────────────────────────────────────────────────────────
    let notifier = TelegramNotifier::new(cfg.telegram_token.clone(), cfg.http_timeout)?;

    // ── Scan ──────────────────────────────────────────────────────────────────
    let runner = Runner::new(
        ScanSettings {
            symbols: cfg.symbols.clone(),
            timeframe: cfg.timeframe,
            symbol_delay: cfg.symbol_delay,
            destination: cfg.telegram_chat_id.clone(),
        },
        chain,
        Box::new(BodyExpansion::new()),
        Arc::new(notifier),
    );
    let report = runner.run().await;

    info!(
        alerts_sent = report.alerts_sent(),
        skipped = report.skipped(),
        "Exiting"
    );
    Ok(())
}
