use crate::common::time::RangeInput;
use crate::common::{Exchange, Interval, MarketKind};
use crate::market::entity::{Candle, FetchRange, RawKline};
use crate::market::error::MarketError;
use crate::market::layout::RowLayout;
use async_trait::async_trait;

/// # Summary
/// 对上游发起的单页请求参数。
///
/// # Invariants
/// - `start_ms <= end_ms`，且区间内最多容纳 `limit` 根 K 线。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub symbol: String,
    pub interval: Interval,
    pub start_ms: i64,
    pub end_ms: i64,
    pub limit: usize,
}

/// # Summary
/// 上游 K 线数据源接口 (单一交易所的单一市场)。
///
/// # Invariants
/// - `fetch_page` 返回的行必须按开盘时间升序排列，倒序上游由实现者负责翻转。
/// - 实现者不做重试，单页失败直接返回 `UpstreamFetch`。
#[async_trait]
pub trait KlineSource: Send + Sync {
    /// 数据源名称，用于日志
    fn name(&self) -> &str;

    /// 单次请求的最大行数
    fn page_limit(&self) -> usize;

    /// 原始行的字段提取表
    fn layout(&self) -> &RowLayout;

    /// 该上游是否提供指定周期
    fn supports(&self, interval: Interval) -> bool;

    /// # Summary
    /// 将客户端的资产名称映射为上游交易对代码。
    ///
    /// # Arguments
    /// * `instrument_name`: 例如 `BTC`、`eth`、`SOL-USDT`。
    ///
    /// # Returns
    /// 上游识别的交易对，例如 `BTCUSDT` 或 `BTC-USDT-SWAP`。
    fn symbol_for(&self, instrument_name: &str) -> String;

    /// # Summary
    /// 抓取 `[start_ms, end_ms]` 区间内的一页原始 K 线。
    ///
    /// # Logic
    /// 1. 按上游协议构建查询参数。
    /// 2. 发送请求 (受单次超时约束) 并校验响应状态。
    /// 3. 解包响应信封，按布局表提取开盘时间。
    ///
    /// # Returns
    /// 成功返回升序排列的原始行，可能为空。
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<RawKline>, MarketError>;
}

/// # Summary
/// 一次 K 线查询的完整参数，由 API 层从查询字符串构建。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleQuery {
    pub exchange: Exchange,
    pub market: MarketKind,
    /// 资产名称，例如 `BTC`
    pub instrument_name: String,
    /// 显式交易对，存在时覆盖 `instrument_name` 的映射结果
    pub symbol: Option<String>,
    pub interval: Interval,
    pub range: RangeInput,
}

/// # Summary
/// 查询结果：标准化后的 K 线序列及其上下文。
#[derive(Debug, Clone, PartialEq)]
pub struct CandleSeries {
    pub exchange: Exchange,
    pub market: MarketKind,
    pub symbol: String,
    pub interval: Interval,
    pub range: FetchRange,
    pub candles: Vec<Candle>,
}

/// # Summary
/// K 线查询服务契约，API 层只依赖此抽象。
///
/// # Invariants
/// - 请求之间不共享可变状态。
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// # Summary
    /// 解析区间、分页抓取并归一化指定资产的 K 线。
    ///
    /// # Returns
    /// 成功返回 `CandleSeries` (K 线可能为空)，失败返回 `MarketError`。
    async fn fetch_candles(&self, query: CandleQuery) -> Result<CandleSeries, MarketError>;
}
