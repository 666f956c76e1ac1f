use kandle_core::common::Interval;
use kandle_core::market::error::MarketError;
use kandle_core::market::port::{KlineSource, PageRequest};
use kandle_feed::exchange::{ExchangeClient, build_http_client};
use kandle_feed::profile::{BINANCE_FUTURES, BINANCE_SPOT, BYBIT_SPOT, OKX_SWAP, UpstreamProfile};
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 启动模拟上游并创建指向它的数据源
async fn setup(profile: &'static UpstreamProfile) -> (MockServer, ExchangeClient) {
    let server = MockServer::start().await;
    let client = build_http_client(Duration::from_secs(5)).unwrap();
    let source = ExchangeClient::new(client, profile, server.uri());
    (server, source)
}

fn page(symbol: &str, interval: Interval, start_ms: i64, end_ms: i64) -> PageRequest {
    PageRequest {
        symbol: symbol.to_string(),
        interval,
        start_ms,
        end_ms,
        limit: 1000,
    }
}

/// # Summary
/// Binance 现货：校验查询参数、API Key 头与 12 列数组的解析。
#[tokio::test]
async fn test_binance_spot_page() {
    let (server, source) = setup(&BINANCE_SPOT).await;
    let source = source.with_api_key(Some("test-key".to_string()));

    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("interval", "1h"))
        .and(query_param("startTime", "1609459200000"))
        .and(query_param("endTime", "1609466400000"))
        .and(query_param("limit", "1000"))
        .and(header("X-MBX-APIKEY", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            [1609459200000_i64, "29000.00", "29500.00", "28800.00", "29200.00", "1000.00", 1609462799999_i64, "29000000.00", 5000, "500.00", "14500000.00", "0"],
            [1609462800000_i64, "29200.00", "30000.00", "29100.00", "29800.00", "1200.00", 1609466399999_i64, "35000000.00", 6000, "600.00", "17400000.00", "0"]
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = source
        .fetch_page(&page("BTCUSDT", Interval::Hour1, 1609459200000, 1609466400000))
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].open_time, 1609459200000);
    assert_eq!(rows[1].open_time, 1609462800000);

    let candle = source.layout().candle(&rows[0]).unwrap();
    assert!((candle.open - 29000.0).abs() < 1e-9);
    assert_eq!(candle.close_time, Some(1609462799999));
    assert_eq!(candle.trade_count, Some(5000));
    assert_eq!(candle.taker_buy_quote_volume, Some(14500000.0));
}

/// # Summary
/// Binance 返回 4xx 时，错误中应保留上游的错误码与消息。
#[tokio::test]
async fn test_binance_error_payload_is_carried() {
    let (server, source) = setup(&BINANCE_FUTURES).await;

    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"code": -1121, "msg": "Invalid symbol."})),
        )
        .mount(&server)
        .await;

    let err = source
        .fetch_page(&page("NOPEUSDT", Interval::Minute1, 0, 59_940_000))
        .await
        .unwrap_err();

    match err {
        MarketError::UpstreamFetch(msg) => {
            assert!(msg.contains("-1121"), "got: {msg}");
            assert!(msg.contains("Invalid symbol"), "got: {msg}");
            assert!(msg.contains("400"), "got: {msg}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// 收集日志输出的写入器
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// # Summary
/// 上游返回错误状态时，错误事件以结构化字段记录上游名称、交易对与状态码。
#[tokio::test]
async fn test_upstream_error_is_logged_with_fields() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (server, source) = setup(&BINANCE_FUTURES).await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/klines"))
        .respond_with(ResponseTemplate::new(418).set_body_string("teapot"))
        .mount(&server)
        .await;

    let err = source
        .fetch_page(&page("NOPEUSDT", Interval::Minute1, 0, 59_940_000))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::UpstreamFetch(_)));

    let text = logs.text();
    let line = text
        .lines()
        .find(|line| line.contains("upstream returned error status"))
        .unwrap_or_else(|| panic!("no error event in: {text}"));
    assert!(line.contains("ERROR"), "got: {line}");
    assert!(line.contains("upstream=") && line.contains("binance-futures"), "got: {line}");
    assert!(line.contains("symbol=NOPEUSDT"), "got: {line}");
    assert!(line.contains("status=418"), "got: {line}");
}

/// # Summary
/// Bybit 倒序返回，数据源应翻转为升序。
#[tokio::test]
async fn test_bybit_rows_are_reversed() {
    let (server, source) = setup(&BYBIT_SPOT).await;

    Mock::given(method("GET"))
        .and(path("/v5/market/kline"))
        .and(query_param("category", "spot"))
        .and(query_param("symbol", "ETHUSDT"))
        .and(query_param("interval", "60"))
        .and(query_param("start", "0"))
        .and(query_param("end", "7200000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "category": "spot",
                "symbol": "ETHUSDT",
                "list": [
                    ["7200000", "3", "3", "3", "3", "30", "90"],
                    ["3600000", "2", "2", "2", "2", "20", "40"],
                    ["0", "1", "1", "1", "1", "10", "10"]
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = source
        .fetch_page(&page("ETHUSDT", Interval::Hour1, 0, 7_200_000))
        .await
        .unwrap();

    let times: Vec<i64> = rows.iter().map(|r| r.open_time).collect();
    assert_eq!(times, vec![0, 3_600_000, 7_200_000]);

    let last = source.layout().candle(&rows[2]).unwrap();
    assert_eq!(last.volume, 30.0);
    assert_eq!(last.quote_volume, Some(90.0));
    assert!(last.close_time.is_none());
}

/// # Summary
/// OKX 永续：开区间参数、业务错误码以及以 volCcy 作为成交量。
#[tokio::test]
async fn test_okx_swap_page_and_error_code() {
    let (server, source) = setup(&OKX_SWAP).await;

    Mock::given(method("GET"))
        .and(path("/api/v5/market/history-candles"))
        .and(query_param("instId", "BTC-USDT-SWAP"))
        .and(query_param("bar", "1m"))
        .and(query_param("after", "120001"))
        .and(query_param("before", "-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "0",
            "msg": "",
            "data": [
                ["60000", "101", "102", "100", "101.5", "250", "2.5", "253.75", "1"],
                ["0", "100", "101", "99", "101", "300", "3", "303", "1"]
            ]
        })))
        .mount(&server)
        .await;

    let rows = source
        .fetch_page(&page("BTC-USDT-SWAP", Interval::Minute1, 0, 120_000))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].open_time, 0);

    let first = source.layout().candle(&rows[0]).unwrap();
    assert_eq!(first.volume, 3.0);
    assert_eq!(first.quote_volume, Some(303.0));

    let (server, source) = setup(&OKX_SWAP).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "51001",
            "msg": "Instrument ID does not exist",
            "data": []
        })))
        .mount(&server)
        .await;

    let err = source
        .fetch_page(&page("NOPE-USDT-SWAP", Interval::Minute1, 0, 120_000))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::UpstreamFetch(ref m) if m.contains("Instrument ID")));
}

/// # Summary
/// 上游未提供的周期在发请求前即被拒绝。
#[tokio::test]
async fn test_unsupported_interval_sends_nothing() {
    let (server, source) = setup(&BYBIT_SPOT).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(!source.supports(Interval::Hour8));
    let err = source
        .fetch_page(&page("BTCUSDT", Interval::Hour8, 0, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::UnsupportedInterval(_)));
}
