use crate::market::error::MarketError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod time;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// # Summary
/// K 线周期枚举，定义单根 K 线覆盖的时间跨度。
///
/// # Invariants
/// - 每个周期都对应一个严格为正的毫秒时长，分页游标依赖该时长推进。
/// - 各上游的线上周期写法由上游描述表负责映射，本枚举只承载符号含义。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Interval {
    Minute1,
    Minute3,
    Minute5,
    Minute15,
    Minute30,
    Hour1,
    Hour2,
    Hour4,
    Hour6,
    Hour8,
    Hour12,
    Day1,
    Week1,
}

impl Interval {
    /// 全部受支持的周期，按时长升序排列
    pub const ALL: [Interval; 13] = [
        Interval::Minute1,
        Interval::Minute3,
        Interval::Minute5,
        Interval::Minute15,
        Interval::Minute30,
        Interval::Hour1,
        Interval::Hour2,
        Interval::Hour4,
        Interval::Hour6,
        Interval::Hour8,
        Interval::Hour12,
        Interval::Day1,
        Interval::Week1,
    ];

    /// 单根 K 线的毫秒时长
    pub const fn duration_ms(self) -> i64 {
        match self {
            Interval::Minute1 => MINUTE_MS,
            Interval::Minute3 => 3 * MINUTE_MS,
            Interval::Minute5 => 5 * MINUTE_MS,
            Interval::Minute15 => 15 * MINUTE_MS,
            Interval::Minute30 => 30 * MINUTE_MS,
            Interval::Hour1 => HOUR_MS,
            Interval::Hour2 => 2 * HOUR_MS,
            Interval::Hour4 => 4 * HOUR_MS,
            Interval::Hour6 => 6 * HOUR_MS,
            Interval::Hour8 => 8 * HOUR_MS,
            Interval::Hour12 => 12 * HOUR_MS,
            Interval::Day1 => DAY_MS,
            Interval::Week1 => 7 * DAY_MS,
        }
    }

    /// 对外展示的标准写法 (与查询参数 `resolution` 一致)
    pub const fn as_str(self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute3 => "3m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
            Interval::Hour1 => "1h",
            Interval::Hour2 => "2h",
            Interval::Hour4 => "4h",
            Interval::Hour6 => "6h",
            Interval::Hour8 => "8h",
            Interval::Hour12 => "12h",
            Interval::Day1 => "1d",
            Interval::Week1 => "1w",
        }
    }
}

impl FromStr for Interval {
    type Err = MarketError;

    /// # Summary
    /// 解析客户端传入的周期写法。
    ///
    /// # Logic
    /// 1. 去除首尾空白。
    /// 2. 与标准写法逐一比对 (区分大小写，`1M` 在交易所语义中是月线)，
    ///    未知写法直接拒绝，不做默认值替换。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Interval::ALL
            .into_iter()
            .find(|interval| interval.as_str() == wanted)
            .ok_or_else(|| MarketError::UnsupportedInterval(s.to_string()))
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Summary
/// 市场类型：现货或永续合约。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MarketKind {
    Spot,
    Futures,
}

impl FromStr for MarketKind {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spot" => Ok(MarketKind::Spot),
            "futures" => Ok(MarketKind::Futures),
            _ => Err(MarketError::InvalidRequest(format!(
                "market must be 'spot' or 'futures', got '{}'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for MarketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketKind::Spot => write!(f, "spot"),
            MarketKind::Futures => write!(f, "futures"),
        }
    }
}

/// # Summary
/// 可选的上游交易所。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Exchange {
    Binance,
    Bybit,
    Okx,
}

impl FromStr for Exchange {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(Exchange::Binance),
            "bybit" => Ok(Exchange::Bybit),
            "okx" => Ok(Exchange::Okx),
            _ => Err(MarketError::InvalidRequest(format!(
                "exchange must be one of binance, bybit, okx, got '{}'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exchange::Binance => write!(f, "binance"),
            Exchange::Bybit => write!(f, "bybit"),
            Exchange::Okx => write!(f, "okx"),
        }
    }
}

/// # Summary
/// 从客户端给出的资产名称中提取基础资产代码。
///
/// # Logic
/// 1. 转为大写。
/// 2. 名称中含有 BTC / ETH 时直接归一到对应主流币 (兼容 `BTC-PERPETUAL` 之类的合约名)。
/// 3. 否则去掉分隔符与 `USDT` 报价后缀。
///
/// # Arguments
/// * `instrument_name`: 客户端提供的资产名称，例如 `btc`、`ETHUSDT`、`SOL-USDT`。
///
/// # Returns
/// 基础资产代码，例如 `BTC`。
pub fn base_asset(instrument_name: &str) -> String {
    let upper = instrument_name.trim().to_uppercase();
    if upper.contains("BTC") {
        return "BTC".to_string();
    }
    if upper.contains("ETH") {
        return "ETH".to_string();
    }
    let compact: String = upper
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | '/'))
        .collect();
    match compact.strip_suffix("USDT") {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => compact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_parse_and_duration() {
        assert_eq!("1m".parse::<Interval>().unwrap(), Interval::Minute1);
        assert_eq!(" 4h ".parse::<Interval>().unwrap(), Interval::Hour4);
        assert_eq!("1w".parse::<Interval>().unwrap(), Interval::Week1);
        assert_eq!(Interval::Hour1.duration_ms(), 3_600_000);
        assert_eq!(Interval::Day1.duration_ms(), 86_400_000);

        for interval in Interval::ALL {
            assert!(interval.duration_ms() > 0);
            assert_eq!(interval.as_str().parse::<Interval>().unwrap(), interval);
        }
    }

    #[test]
    fn test_unknown_interval_is_rejected() {
        let err = "2m".parse::<Interval>().unwrap_err();
        assert!(matches!(err, MarketError::UnsupportedInterval(ref s) if s == "2m"));
        assert!("".parse::<Interval>().is_err());
    }

    #[test]
    fn test_interval_tokens_are_case_sensitive() {
        for token in ["1M", "4H", "1D", "1W"] {
            let err = token.parse::<Interval>().unwrap_err();
            assert!(matches!(err, MarketError::UnsupportedInterval(ref s) if s == token));
        }
    }

    #[test]
    fn test_market_and_exchange_parse() {
        assert_eq!("Futures".parse::<MarketKind>().unwrap(), MarketKind::Futures);
        assert!("margin".parse::<MarketKind>().is_err());
        assert_eq!("OKX".parse::<Exchange>().unwrap(), Exchange::Okx);
        assert!("kraken".parse::<Exchange>().is_err());
    }

    #[test]
    fn test_base_asset() {
        assert_eq!(base_asset("btc"), "BTC");
        assert_eq!(base_asset("BTC-PERPETUAL"), "BTC");
        assert_eq!(base_asset("ethusdt"), "ETH");
        assert_eq!(base_asset("SOL-USDT"), "SOL");
        assert_eq!(base_asset("XRPUSDT"), "XRP");
        assert_eq!(base_asset("doge"), "DOGE");
    }
}
