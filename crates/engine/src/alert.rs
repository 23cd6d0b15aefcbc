use common::{Signal, Timeframe};

/// `2024-03-01 08:00 UTC`
pub fn format_time(candle_open_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(candle_open_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| candle_open_ms.to_string())
}

/// Render a signal as a Telegram HTML message.
pub fn format_alert(signal: &Signal, timeframe: Timeframe) -> String {
    let tf = timeframe.to_string().to_uppercase();
    let symbol = escape_html(&signal.symbol);
    let emoji = match signal.direction {
        common::Direction::Long => "🟢",
        common::Direction::Short => "🔴",
    };
    let [prev2, prev1, current] = signal.reference_bodies;

    format!(
        "🚨 <b>HTF {tf} SETUP FOUND</b>\n\
         \n\
         <b>Symbol:</b> {symbol}\n\
         <b>Direction:</b> {direction} {emoji}\n\
         <b>Candle Color:</b> {colour}\n\
         \n\
         <b>Entry Candle Time:</b> {time}\n\
         <b>Entry Price:</b> ${entry:.2}\n\
         <b>Stop Loss:</b> ${stop:.2}\n\
         <b>Take Profit (0.5R):</b> ${target:.2}\n\
         \n\
         <b>Candle Bodies:</b>\n\
         • Current: {current:.2}\n\
         • Previous 1: {prev1:.2}\n\
         • Previous 2: {prev2:.2}\n\
         \n\
         ✅ Current body is BIGGER than both previous candles!\n\
         \n\
         <i>Verify on TradingView: BINANCE:{symbol} {tf} chart</i>",
        direction = signal.direction,
        colour = signal.direction.colour(),
        time = format_time(signal.trigger_candle.open_time),
        entry = signal.entry_price,
        stop = signal.stop_loss,
        target = signal.take_profit,
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use common::{Candle, Direction};

    use super::*;

    fn long_signal() -> Signal {
        Signal {
            symbol: "BTCUSDT".into(),
            direction: Direction::Long,
            entry_price: 108.0,
            stop_loss: 99.0,
            take_profit: 112.5,
            trigger_candle: Candle {
                // 2024-03-01T08:00:00Z
                open_time: 1_709_280_000_000,
                open: 100.5,
                high: 109.0,
                low: 99.0,
                close: 108.0,
                volume: None,
            },
            reference_bodies: [1.0, 0.5, 7.5],
        }
    }

    #[test]
    fn time_is_rendered_in_utc() {
        assert_eq!(format_time(1_709_280_000_000), "2024-03-01 08:00 UTC");
    }

    #[test]
    fn alert_contains_levels_and_bodies() {
        let text = format_alert(&long_signal(), Timeframe::H4);

        assert!(text.contains("HTF 4H SETUP FOUND"));
        assert!(text.contains("<b>Symbol:</b> BTCUSDT"));
        assert!(text.contains("<b>Direction:</b> LONG 🟢"));
        assert!(text.contains("<b>Candle Color:</b> GREEN"));
        assert!(text.contains("<b>Entry Candle Time:</b> 2024-03-01 08:00 UTC"));
        assert!(text.contains("<b>Entry Price:</b> $108.00"));
        assert!(text.contains("<b>Stop Loss:</b> $99.00"));
        assert!(text.contains("<b>Take Profit (0.5R):</b> $112.50"));
        assert!(text.contains("• Current: 7.50"));
        assert!(text.contains("• Previous 1: 0.50"));
        assert!(text.contains("• Previous 2: 1.00"));
        assert!(text.contains("BINANCE:BTCUSDT 4H chart"));
    }

    #[test]
    fn short_alert_is_red() {
        let mut signal = long_signal();
        signal.direction = Direction::Short;
        let text = format_alert(&signal, Timeframe::H4);
        assert!(text.contains("SHORT 🔴"));
        assert!(text.contains("RED"));
    }

    #[test]
    fn symbol_is_escaped() {
        let mut signal = long_signal();
        signal.symbol = "A<B>&C".into();
        let text = format_alert(&signal, Timeframe::H4);
        assert!(text.contains("A&lt;B&gt;&amp;C"));
    }
}
