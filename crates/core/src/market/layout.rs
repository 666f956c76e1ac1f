use crate::market::entity::{Candle, RawKline};
use crate::market::error::MarketError;
use serde_json::Value;

/// # Summary
/// 上游 K 线行的定位提取表：声明每个标准字段位于原始数组的哪个下标。
///
/// # Invariants
/// - 必选字段 (开盘时间与 OHLCV) 必须存在且可解析，否则视为解析错误。
/// - 可选字段缺失或无法解析时直接省略，不导致失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub open_time: usize,
    pub open: usize,
    pub high: usize,
    pub low: usize,
    pub close: usize,
    pub volume: usize,
    pub close_time: Option<usize>,
    pub quote_volume: Option<usize>,
    pub trade_count: Option<usize>,
    pub taker_buy_base_volume: Option<usize>,
    pub taker_buy_quote_volume: Option<usize>,
}

impl RowLayout {
    /// # Summary
    /// 从原始数组构造 `RawKline`，只提取分页所需的开盘时间。
    ///
    /// # Arguments
    /// * `fields`: 上游返回的一行定位数组。
    ///
    /// # Returns
    /// 开盘时间缺失或不是整数时返回 `Parse`。
    pub fn raw(&self, fields: Vec<Value>) -> Result<RawKline, MarketError> {
        let open_time = int_at(&fields, self.open_time)
            .ok_or_else(|| MarketError::Parse(format!("missing open time in row {:?}", fields)))?;
        Ok(RawKline { open_time, fields })
    }

    /// # Summary
    /// 按提取表将原始行映射为标准 `Candle`。
    ///
    /// # Logic
    /// 1. 逐个读取 OHLCV，任一缺失即报错。
    /// 2. 可选字段按下标读取，缺失为 `None`。
    pub fn candle(&self, row: &RawKline) -> Result<Candle, MarketError> {
        let fields = &row.fields;
        let required = |idx: usize, name: &str| {
            float_at(fields, idx).ok_or_else(|| {
                MarketError::Parse(format!(
                    "missing {} at index {} for open time {}",
                    name, idx, row.open_time
                ))
            })
        };
        let optional_float = |idx: Option<usize>| idx.and_then(|i| float_at(fields, i));

        Ok(Candle {
            open_time: row.open_time,
            open: required(self.open, "open")?,
            high: required(self.high, "high")?,
            low: required(self.low, "low")?,
            close: required(self.close, "close")?,
            volume: required(self.volume, "volume")?,
            close_time: self.close_time.and_then(|i| int_at(fields, i)),
            quote_volume: optional_float(self.quote_volume),
            trade_count: self
                .trade_count
                .and_then(|i| int_at(fields, i))
                .and_then(|n| u64::try_from(n).ok()),
            taker_buy_base_volume: optional_float(self.taker_buy_base_volume),
            taker_buy_quote_volume: optional_float(self.taker_buy_quote_volume),
        })
    }
}

/// 读取整数字段，兼容 JSON 数字与数字字符串两种写法
pub fn int_at(fields: &[Value], idx: usize) -> Option<i64> {
    match fields.get(idx)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 读取浮点字段，兼容 JSON 数字与数字字符串两种写法
pub fn float_at(fields: &[Value], idx: usize) -> Option<f64> {
    match fields.get(idx)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LAYOUT: RowLayout = RowLayout {
        open_time: 0,
        open: 1,
        high: 2,
        low: 3,
        close: 4,
        volume: 5,
        close_time: Some(6),
        quote_volume: None,
        trade_count: Some(7),
        taker_buy_base_volume: Some(8),
        taker_buy_quote_volume: None,
    };

    fn fields(value: Value) -> Vec<Value> {
        value.as_array().cloned().unwrap()
    }

    #[test]
    fn test_mixed_string_and_number_fields() {
        let raw = LAYOUT
            .raw(fields(json!(["1000", "1.5", 2, "0.5", "1.25", "10", 1999, 42, "3.5"])))
            .unwrap();
        assert_eq!(raw.open_time, 1000);

        let candle = LAYOUT.candle(&raw).unwrap();
        assert_eq!(candle.open, 1.5);
        assert_eq!(candle.high, 2.0);
        assert_eq!(candle.close_time, Some(1999));
        assert_eq!(candle.trade_count, Some(42));
        assert_eq!(candle.taker_buy_base_volume, Some(3.5));
        assert_eq!(candle.quote_volume, None);
    }

    #[test]
    fn test_missing_optional_fields_are_omitted() {
        let raw = LAYOUT
            .raw(fields(json!([1000, "1", "2", "0.5", "1.5", "7"])))
            .unwrap();
        let candle = LAYOUT.candle(&raw).unwrap();
        assert_eq!(candle.volume, 7.0);
        assert!(candle.close_time.is_none());
        assert!(candle.trade_count.is_none());
    }

    #[test]
    fn test_missing_required_field_fails() {
        assert!(LAYOUT.raw(fields(json!(["abc", "1"]))).is_err());

        let raw = LAYOUT.raw(fields(json!([1000, "1", "2", null]))).unwrap();
        let err = LAYOUT.candle(&raw).unwrap_err();
        assert!(matches!(err, MarketError::Parse(ref msg) if msg.contains("low")));
    }
}
