use kandle_core::common::{Exchange, Interval, MarketKind, base_asset};
use kandle_core::market::error::MarketError;
use kandle_core::market::layout::RowLayout;
use kandle_core::market::port::PageRequest;
use serde::Deserialize;
use serde_json::Value;

/// # Summary
/// 上游单页内的行顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    OldestFirst,
    NewestFirst,
}

/// # Summary
/// 上游响应的外层包装形态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// 直接返回二维数组 (Binance)
    Bare,
    /// `{retCode, retMsg, result: {list}}` (Bybit v5)
    Bybit,
    /// `{code, msg, data}` (OKX v5)
    Okx,
}

/// # Summary
/// 查询参数的命名方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStyle {
    /// `symbol, interval, startTime, endTime, limit`
    Binance,
    /// `category, symbol, interval, start, end, limit`
    Bybit { category: &'static str },
    /// `instId, bar, after, before, limit`，`after`/`before` 为开区间
    Okx,
}

/// # Summary
/// 交易对代码的拼写方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolStyle {
    /// `BTCUSDT`
    Concat,
    /// `BTC-USDT` 加后缀，例如 `-SWAP`
    Dashed { suffix: &'static str },
}

/// # Summary
/// 单个上游 (交易所 + 市场) 的声明式描述表。
///
/// # Invariants
/// - 进程启动后不可变，以 `static` 形式存在。
/// - `intervals` 中未列出的周期视为该上游不支持。
#[derive(Debug)]
pub struct UpstreamProfile {
    pub name: &'static str,
    pub exchange: Exchange,
    pub market: MarketKind,
    pub path: &'static str,
    pub page_limit: usize,
    pub order: RowOrder,
    pub envelope: Envelope,
    pub query: QueryStyle,
    pub symbols: SymbolStyle,
    pub layout: RowLayout,
    pub intervals: &'static [(Interval, &'static str)],
}

// [openTime, open, high, low, close, volume, closeTime, quoteVolume, trades, takerBuyBase, takerBuyQuote, ignore]
const BINANCE_LAYOUT: RowLayout = RowLayout {
    open_time: 0,
    open: 1,
    high: 2,
    low: 3,
    close: 4,
    volume: 5,
    close_time: Some(6),
    quote_volume: Some(7),
    trade_count: Some(8),
    taker_buy_base_volume: Some(9),
    taker_buy_quote_volume: Some(10),
};

// [startTime, open, high, low, close, volume, turnover]
const BYBIT_LAYOUT: RowLayout = RowLayout {
    open_time: 0,
    open: 1,
    high: 2,
    low: 3,
    close: 4,
    volume: 5,
    close_time: None,
    quote_volume: Some(6),
    trade_count: None,
    taker_buy_base_volume: None,
    taker_buy_quote_volume: None,
};

// [ts, o, h, l, c, vol, volCcy, volCcyQuote, confirm]
// 现货的 vol 即基础币数量
const OKX_SPOT_LAYOUT: RowLayout = RowLayout {
    open_time: 0,
    open: 1,
    high: 2,
    low: 3,
    close: 4,
    volume: 5,
    close_time: None,
    quote_volume: Some(7),
    trade_count: None,
    taker_buy_base_volume: None,
    taker_buy_quote_volume: None,
};

// 永续合约的 vol 是张数，基础币数量在 volCcy
const OKX_SWAP_LAYOUT: RowLayout = RowLayout {
    volume: 6,
    ..OKX_SPOT_LAYOUT
};

const BINANCE_INTERVALS: &[(Interval, &str)] = &[
    (Interval::Minute1, "1m"),
    (Interval::Minute3, "3m"),
    (Interval::Minute5, "5m"),
    (Interval::Minute15, "15m"),
    (Interval::Minute30, "30m"),
    (Interval::Hour1, "1h"),
    (Interval::Hour2, "2h"),
    (Interval::Hour4, "4h"),
    (Interval::Hour6, "6h"),
    (Interval::Hour8, "8h"),
    (Interval::Hour12, "12h"),
    (Interval::Day1, "1d"),
    (Interval::Week1, "1w"),
];

const BYBIT_INTERVALS: &[(Interval, &str)] = &[
    (Interval::Minute1, "1"),
    (Interval::Minute3, "3"),
    (Interval::Minute5, "5"),
    (Interval::Minute15, "15"),
    (Interval::Minute30, "30"),
    (Interval::Hour1, "60"),
    (Interval::Hour2, "120"),
    (Interval::Hour4, "240"),
    (Interval::Hour6, "360"),
    (Interval::Hour12, "720"),
    (Interval::Day1, "D"),
    (Interval::Week1, "W"),
];

// 6H 及以上默认按香港时间对齐，需使用 utc 版本
const OKX_INTERVALS: &[(Interval, &str)] = &[
    (Interval::Minute1, "1m"),
    (Interval::Minute3, "3m"),
    (Interval::Minute5, "5m"),
    (Interval::Minute15, "15m"),
    (Interval::Minute30, "30m"),
    (Interval::Hour1, "1H"),
    (Interval::Hour2, "2H"),
    (Interval::Hour4, "4H"),
    (Interval::Hour6, "6Hutc"),
    (Interval::Hour12, "12Hutc"),
    (Interval::Day1, "1Dutc"),
    (Interval::Week1, "1Wutc"),
];

pub static BINANCE_SPOT: UpstreamProfile = UpstreamProfile {
    name: "binance-spot",
    exchange: Exchange::Binance,
    market: MarketKind::Spot,
    path: "/api/v3/klines",
    page_limit: 1000,
    order: RowOrder::OldestFirst,
    envelope: Envelope::Bare,
    query: QueryStyle::Binance,
    symbols: SymbolStyle::Concat,
    layout: BINANCE_LAYOUT,
    intervals: BINANCE_INTERVALS,
};

pub static BINANCE_FUTURES: UpstreamProfile = UpstreamProfile {
    name: "binance-futures",
    exchange: Exchange::Binance,
    market: MarketKind::Futures,
    path: "/fapi/v1/klines",
    page_limit: 1000,
    order: RowOrder::OldestFirst,
    envelope: Envelope::Bare,
    query: QueryStyle::Binance,
    symbols: SymbolStyle::Concat,
    layout: BINANCE_LAYOUT,
    intervals: BINANCE_INTERVALS,
};

pub static BYBIT_SPOT: UpstreamProfile = UpstreamProfile {
    name: "bybit-spot",
    exchange: Exchange::Bybit,
    market: MarketKind::Spot,
    path: "/v5/market/kline",
    page_limit: 1000,
    order: RowOrder::NewestFirst,
    envelope: Envelope::Bybit,
    query: QueryStyle::Bybit { category: "spot" },
    symbols: SymbolStyle::Concat,
    layout: BYBIT_LAYOUT,
    intervals: BYBIT_INTERVALS,
};

pub static BYBIT_LINEAR: UpstreamProfile = UpstreamProfile {
    name: "bybit-linear",
    exchange: Exchange::Bybit,
    market: MarketKind::Futures,
    path: "/v5/market/kline",
    page_limit: 1000,
    order: RowOrder::NewestFirst,
    envelope: Envelope::Bybit,
    query: QueryStyle::Bybit { category: "linear" },
    symbols: SymbolStyle::Concat,
    layout: BYBIT_LAYOUT,
    intervals: BYBIT_INTERVALS,
};

pub static OKX_SPOT: UpstreamProfile = UpstreamProfile {
    name: "okx-spot",
    exchange: Exchange::Okx,
    market: MarketKind::Spot,
    path: "/api/v5/market/history-candles",
    page_limit: 100,
    order: RowOrder::NewestFirst,
    envelope: Envelope::Okx,
    query: QueryStyle::Okx,
    symbols: SymbolStyle::Dashed { suffix: "" },
    layout: OKX_SPOT_LAYOUT,
    intervals: OKX_INTERVALS,
};

pub static OKX_SWAP: UpstreamProfile = UpstreamProfile {
    name: "okx-swap",
    exchange: Exchange::Okx,
    market: MarketKind::Futures,
    path: "/api/v5/market/history-candles",
    page_limit: 100,
    order: RowOrder::NewestFirst,
    envelope: Envelope::Okx,
    query: QueryStyle::Okx,
    symbols: SymbolStyle::Dashed { suffix: "-SWAP" },
    layout: OKX_SWAP_LAYOUT,
    intervals: OKX_INTERVALS,
};

/// 全部内置上游
pub static ALL_PROFILES: [&UpstreamProfile; 6] = [
    &BINANCE_SPOT,
    &BINANCE_FUTURES,
    &BYBIT_SPOT,
    &BYBIT_LINEAR,
    &OKX_SPOT,
    &OKX_SWAP,
];

impl UpstreamProfile {
    /// 指定周期在该上游的写法，不支持时返回 `None`
    pub fn interval_token(&self, interval: Interval) -> Option<&'static str> {
        self.intervals
            .iter()
            .find(|(candidate, _)| *candidate == interval)
            .map(|(_, token)| *token)
    }

    /// 资产名称映射为该上游的交易对代码
    pub fn symbol_for(&self, instrument_name: &str) -> String {
        let base = base_asset(instrument_name);
        match self.symbols {
            SymbolStyle::Concat => format!("{}USDT", base),
            SymbolStyle::Dashed { suffix } => format!("{}-USDT{}", base, suffix),
        }
    }

    /// # Summary
    /// 构建单页请求的查询参数。
    ///
    /// # Logic
    /// 1. Binance / Bybit 直接使用闭区间 `[start, end]`。
    /// 2. OKX 的 `after` 表示早于、`before` 表示晚于，均为开区间，需要各自外扩 1 毫秒。
    ///
    /// # Returns
    /// 周期不受支持时返回 `UnsupportedInterval`。
    pub fn query_params(
        &self,
        request: &PageRequest,
    ) -> Result<Vec<(&'static str, String)>, MarketError> {
        let token = self
            .interval_token(request.interval)
            .ok_or_else(|| self.unsupported(request.interval))?;
        let limit = request.limit.to_string();

        let params = match self.query {
            QueryStyle::Binance => vec![
                ("symbol", request.symbol.clone()),
                ("interval", token.to_string()),
                ("startTime", request.start_ms.to_string()),
                ("endTime", request.end_ms.to_string()),
                ("limit", limit),
            ],
            QueryStyle::Bybit { category } => vec![
                ("category", category.to_string()),
                ("symbol", request.symbol.clone()),
                ("interval", token.to_string()),
                ("start", request.start_ms.to_string()),
                ("end", request.end_ms.to_string()),
                ("limit", limit),
            ],
            QueryStyle::Okx => vec![
                ("instId", request.symbol.clone()),
                ("bar", token.to_string()),
                ("after", request.end_ms.saturating_add(1).to_string()),
                ("before", request.start_ms.saturating_sub(1).to_string()),
                ("limit", limit),
            ],
        };
        Ok(params)
    }

    /// # Summary
    /// 解包响应体，取出原始行数组。
    ///
    /// # Logic
    /// 1. 按信封类型反序列化。
    /// 2. 信封内的业务错误码非零时视为上游失败，携带原始消息。
    pub fn unwrap_rows(&self, body: &str) -> Result<Vec<Vec<Value>>, MarketError> {
        let parse_err = |e: serde_json::Error| {
            MarketError::Parse(format!("{} returned unexpected body ({}): {}", self.name, e, body))
        };
        match self.envelope {
            Envelope::Bare => serde_json::from_str(body).map_err(parse_err),
            Envelope::Bybit => {
                let envelope: BybitEnvelope = serde_json::from_str(body).map_err(parse_err)?;
                if envelope.ret_code != 0 {
                    return Err(MarketError::UpstreamFetch(format!(
                        "{} error {}: {}",
                        self.name, envelope.ret_code, envelope.ret_msg
                    )));
                }
                Ok(envelope.result.map(|r| r.list).unwrap_or_default())
            }
            Envelope::Okx => {
                let envelope: OkxEnvelope = serde_json::from_str(body).map_err(parse_err)?;
                if envelope.code != "0" {
                    return Err(MarketError::UpstreamFetch(format!(
                        "{} error {}: {}",
                        self.name, envelope.code, envelope.msg
                    )));
                }
                Ok(envelope.data)
            }
        }
    }

    fn unsupported(&self, interval: Interval) -> MarketError {
        MarketError::UnsupportedInterval(format!("{} is not offered by {}", interval, self.name))
    }
}

#[derive(Debug, Deserialize)]
struct BybitEnvelope {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    result: Option<BybitResult>,
}

#[derive(Debug, Deserialize)]
struct BybitResult {
    #[serde(default)]
    list: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct OkxEnvelope {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}
