use std::time::Duration;

use common::{CandleSource, Error, Timeframe};
use engine::http::build_client;
use engine::{BinanceSource, BybitSource, CoinGeckoSource};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const H4: i64 = 4 * 60 * 60 * 1000;
// 2024-03-01T00:00:00Z, long closed by the time these tests run
const T0: i64 = 1_709_251_200_000;

/// Answer exactly one HTTP request with `status` and `body`.
///
/// Returns the base URL to hand to a source and a handle resolving to the
/// request line the server saw.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;

        String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });

    (format!("http://{addr}"), handle)
}

fn client() -> reqwest::Client {
    build_client(Duration::from_secs(5)).unwrap()
}

fn binance_rows(n: i64) -> String {
    let rows: Vec<String> = (0..n)
        .map(|i| {
            let open_time = T0 + i * H4;
            format!(
                r#"[{open_time},"100.0","110.0","90.0","{}.0","12.5",{},"1000.0",42,"6.0","600.0","0"]"#,
                101 + i,
                open_time + H4 - 1
            )
        })
        .collect();
    format!("[{}]", rows.join(","))
}

fn bybit_rows(n: i64) -> String {
    // Newest first, as Bybit returns them
    let rows: Vec<String> = (0..n)
        .rev()
        .map(|i| {
            format!(
                r#"["{}","100.0","110.0","90.0","{}.0","3.5","350.0"]"#,
                T0 + i * H4,
                101 + i
            )
        })
        .collect();
    format!(
        r#"{{"retCode":0,"retMsg":"OK","result":{{"category":"spot","symbol":"BTCUSDT","list":[{}]}},"time":0}}"#,
        rows.join(",")
    )
}

#[tokio::test]
async fn binance_blocked_region_is_source_unavailable() {
    let (base_url, server) =
        serve_once("451 Unavailable For Legal Reasons", r#"{"code":0,"msg":"restricted"}"#.into())
            .await;
    let source = BinanceSource::new("binance", base_url, client());

    let err = source.fetch("BTCUSDT", Timeframe::H4, 3).await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(
        err,
        Error::SourceUnavailable { provider, reason }
            if provider == "binance" && reason.contains("blocked from this location") && reason.contains("451")
    ));
}

#[tokio::test]
async fn binance_requests_one_extra_row_and_returns_count() {
    let (base_url, server) = serve_once("200 OK", binance_rows(4)).await;
    let source = BinanceSource::new("binance-vision", base_url, client());

    let series = source.fetch("BTCUSDT", Timeframe::H4, 3).await.unwrap();
    let request_line = server.await.unwrap();

    assert!(request_line.starts_with("GET /api/v3/klines?"));
    assert!(request_line.contains("symbol=BTCUSDT"));
    assert!(request_line.contains("interval=4h"));
    assert!(request_line.contains("limit=4"));

    assert_eq!(series.len(), 3);
    let times: Vec<i64> = series.candles().iter().map(|c| c.open_time).collect();
    assert_eq!(times, vec![T0 + H4, T0 + 2 * H4, T0 + 3 * H4]);
    assert_eq!(series.last().unwrap().close, 104.0);
}

#[tokio::test]
async fn binance_server_error_is_source_unavailable() {
    let (base_url, server) = serve_once("502 Bad Gateway", "upstream down".into()).await;
    let source = BinanceSource::new("binance", base_url, client());

    let err = source.fetch("ETHUSDT", Timeframe::H4, 3).await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(
        err,
        Error::SourceUnavailable { reason, .. } if reason.contains("502")
    ));
}

#[tokio::test]
async fn bybit_non_zero_ret_code_is_source_unavailable() {
    let body = r#"{"retCode":10001,"retMsg":"Not supported symbols","result":{},"time":0}"#;
    let (base_url, server) = serve_once("200 OK", body.into()).await;
    let source = BybitSource::new(base_url, client());

    let err = source.fetch("FOOUSDT", Timeframe::H4, 3).await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(
        err,
        Error::SourceUnavailable { provider, reason }
            if provider == "bybit" && reason.contains("10001")
    ));
}

#[tokio::test]
async fn bybit_requests_spot_240_and_returns_count_ascending() {
    let (base_url, server) = serve_once("200 OK", bybit_rows(4)).await;
    let source = BybitSource::new(base_url, client());

    let series = source.fetch("SOLUSDT", Timeframe::H4, 3).await.unwrap();
    let request_line = server.await.unwrap();

    assert!(request_line.starts_with("GET /v5/market/kline?"));
    assert!(request_line.contains("category=spot"));
    assert!(request_line.contains("interval=240"));
    assert!(request_line.contains("limit=4"));

    let times: Vec<i64> = series.candles().iter().map(|c| c.open_time).collect();
    assert_eq!(times, vec![T0 + H4, T0 + 2 * H4, T0 + 3 * H4]);
}

#[tokio::test]
async fn coingecko_unknown_symbol_fails_without_a_request() {
    // Nothing listens here; the mapping fails before any connection attempt.
    let source = CoinGeckoSource::new("http://127.0.0.1:9", client());

    let err = source.fetch("FOOUSDT", Timeframe::H4, 3).await.unwrap_err();

    assert!(matches!(
        err,
        Error::SourceUnavailable { provider, reason }
            if provider == "coingecko" && reason.contains("FOOUSDT")
    ));
}

#[tokio::test]
async fn coingecko_rate_limit_is_source_unavailable() {
    let (base_url, server) =
        serve_once("429 Too Many Requests", r#"{"status":{"error_code":429}}"#.into()).await;
    let source = CoinGeckoSource::new(base_url, client());

    let err = source.fetch("BTCUSDT", Timeframe::H4, 3).await.unwrap_err();
    let request_line = server.await.unwrap();

    assert!(request_line.starts_with("GET /api/v3/coins/bitcoin/market_chart?"));
    assert!(request_line.contains("vs_currency=usd"));
    assert!(matches!(
        err,
        Error::SourceUnavailable { provider, reason }
            if provider == "coingecko" && reason.contains("rate limited")
    ));
}
