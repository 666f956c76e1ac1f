use kandle_core::market::entity::{Candle, RawKline};
use kandle_core::market::error::MarketError;
use kandle_core::market::layout::RowLayout;
use std::collections::BTreeMap;

/// # Summary
/// 按键去重并升序排列。
///
/// # Logic
/// 1. 依次写入以键为索引的有序映射，同键后写入者覆盖先写入者。
/// 2. 按键升序输出。
///
/// # Returns
/// 键严格递增的序列。对输出再次调用结果不变。
pub fn dedupe_by_open_time<T>(items: impl IntoIterator<Item = T>, key: impl Fn(&T) -> i64) -> Vec<T> {
    let mut by_time = BTreeMap::new();
    for item in items {
        by_time.insert(key(&item), item);
    }
    by_time.into_values().collect()
}

/// # Summary
/// 将分页采集得到的原始行归一化为标准 K 线序列。
///
/// # Logic
/// 1. 以开盘时间去重，重叠分页中后出现的行胜出。
/// 2. 升序排列。
/// 3. 按上游布局表映射为 `Candle`。
///
/// # Arguments
/// * `rows`: 按抓取顺序拼接的原始行。
/// * `layout`: 上游字段提取表。
///
/// # Returns
/// 必选字段缺失时返回 `Parse`。
pub fn normalize(rows: Vec<RawKline>, layout: &RowLayout) -> Result<Vec<Candle>, MarketError> {
    dedupe_by_open_time(rows, |row| row.open_time)
        .iter()
        .map(|row| layout.candle(row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    const LAYOUT: RowLayout = RowLayout {
        open_time: 0,
        open: 1,
        high: 2,
        low: 3,
        close: 4,
        volume: 5,
        close_time: None,
        quote_volume: None,
        trade_count: None,
        taker_buy_base_volume: None,
        taker_buy_quote_volume: None,
    };

    fn row(open_time: i64, close: &str) -> RawKline {
        let fields: Vec<Value> = vec![
            json!(open_time),
            json!("1"),
            json!("2"),
            json!("0.5"),
            json!(close),
            json!("10"),
        ];
        RawKline { open_time, fields }
    }

    #[test]
    fn test_later_occurrence_wins_and_sorted() {
        let rows = vec![row(120, "1.0"), row(0, "1.1"), row(60, "1.2"), row(120, "9.9")];
        let candles = normalize(rows, &LAYOUT).unwrap();

        let times: Vec<i64> = candles.iter().map(|c| c.open_time).collect();
        assert_eq!(times, vec![0, 60, 120]);
        assert_eq!(candles[2].close, 9.9);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let rows = vec![row(60, "1"), row(0, "2"), row(60, "3"), row(30, "4")];
        let once = normalize(rows, &LAYOUT).unwrap();
        let twice = dedupe_by_open_time(once.clone(), |c| c.open_time);
        assert_eq!(once, twice);

        for pair in once.windows(2) {
            assert!(pair[0].open_time < pair[1].open_time);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize(Vec::new(), &LAYOUT).unwrap().is_empty());
    }

    #[test]
    fn test_bad_row_is_an_error() {
        let bad = RawKline {
            open_time: 0,
            fields: vec![json!(0), json!("x")],
        };
        assert!(matches!(normalize(vec![bad], &LAYOUT), Err(MarketError::Parse(_))));
    }
}
