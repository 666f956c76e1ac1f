//! K 线序列的 CSV 导出与读取。

use chrono::{DateTime, SecondsFormat};
use kandle_core::market::entity::Candle;
use kandle_core::market::error::MarketError;

/// CSV 表头，列顺序固定
pub const CSV_HEADER: [&str; 11] = [
    "Open time (UTC)",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Close time (UTC)",
    "Quote asset volume",
    "Trades",
    "Taker buy base",
    "Taker buy quote",
];

/// # Summary
/// 将 K 线序列写成 CSV 文本。
///
/// # Logic
/// 1. 首行为固定表头。
/// 2. 时间列输出为毫秒精度的 ISO-8601 UTC 字符串。
/// 3. 数值按最短可还原写法输出，不额外四舍五入；缺失的可选列留空。
///
/// # Returns
/// 时间戳超出可表示范围时返回 `Parse`。
pub fn candles_to_csv(candles: &[Candle]) -> Result<String, MarketError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER).map_err(csv_err)?;
    for candle in candles {
        let record = [
            iso_millis(candle.open_time)?,
            candle.open.to_string(),
            candle.high.to_string(),
            candle.low.to_string(),
            candle.close.to_string(),
            candle.volume.to_string(),
            candle.close_time.map(iso_millis).transpose()?.unwrap_or_default(),
            opt_to_string(candle.quote_volume),
            opt_to_string(candle.trade_count),
            opt_to_string(candle.taker_buy_base_volume),
            opt_to_string(candle.taker_buy_quote_volume),
        ];
        writer.write_record(&record).map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| MarketError::Parse(format!("csv flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| MarketError::Parse(e.to_string()))
}

/// # Summary
/// 读取由 `candles_to_csv` 生成的 CSV 文本。
///
/// # Returns
/// 列数或取值不符时返回 `Parse`。
pub fn candles_from_csv(text: &str) -> Result<Vec<Candle>, MarketError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let mut candles = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();
        let float = |idx: usize| -> Result<f64, MarketError> {
            cell(idx)
                .parse()
                .map_err(|_| MarketError::Parse(format!("bad number in column {}: '{}'", idx, cell(idx))))
        };
        let opt_float = |idx: usize| -> Result<Option<f64>, MarketError> {
            if cell(idx).is_empty() { Ok(None) } else { float(idx).map(Some) }
        };

        candles.push(Candle {
            open_time: parse_iso(cell(0))?,
            open: float(1)?,
            high: float(2)?,
            low: float(3)?,
            close: float(4)?,
            volume: float(5)?,
            close_time: match cell(6) {
                "" => None,
                s => Some(parse_iso(s)?),
            },
            quote_volume: opt_float(7)?,
            trade_count: match cell(8) {
                "" => None,
                s => Some(
                    s.parse()
                        .map_err(|_| MarketError::Parse(format!("bad trade count: '{}'", s)))?,
                ),
            },
            taker_buy_base_volume: opt_float(9)?,
            taker_buy_quote_volume: opt_float(10)?,
        });
    }
    Ok(candles)
}

fn iso_millis(ms: i64) -> Result<String, MarketError> {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| MarketError::Parse(format!("timestamp out of range: {}", ms)))
}

fn parse_iso(s: &str) -> Result<i64, MarketError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| MarketError::Parse(format!("bad timestamp '{}': {}", s, e)))
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_err(e: csv::Error) -> MarketError {
    MarketError::Parse(format!("csv error: {}", e))
}
