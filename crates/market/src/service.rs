use crate::collector::PageCollector;
use crate::normalizer::normalize;
use async_trait::async_trait;
use kandle_core::common::time::LocalCalendar;
use kandle_core::common::{Exchange, MarketKind};
use kandle_core::market::error::MarketError;
use kandle_core::market::port::{CandleProvider, CandleQuery, CandleSeries, KlineSource};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// # Summary
/// K 线查询服务的具体实现：区间解析 → 分页采集 → 归一化。
///
/// # Invariants
/// - 数据源注册表在构造后只读，请求之间不共享可变状态。
pub struct CandleService {
    sources: HashMap<(Exchange, MarketKind), Arc<dyn KlineSource>>,
    calendar: LocalCalendar,
    collector: PageCollector,
}

impl CandleService {
    /// # Summary
    /// 创建服务实例。
    ///
    /// # Arguments
    /// * `calendar`: 解释日期参数使用的本地日历。
    /// * `max_pages`: 单个请求允许的最大分页数。
    pub fn new(calendar: LocalCalendar, max_pages: usize) -> Self {
        Self {
            sources: HashMap::new(),
            calendar,
            collector: PageCollector::new(max_pages),
        }
    }

    /// 注册某个交易所与市场的数据源，重复注册时覆盖旧值
    pub fn with_source(
        mut self,
        exchange: Exchange,
        market: MarketKind,
        source: Arc<dyn KlineSource>,
    ) -> Self {
        self.sources.insert((exchange, market), source);
        self
    }

    fn source(&self, exchange: Exchange, market: MarketKind) -> Result<&Arc<dyn KlineSource>, MarketError> {
        self.sources.get(&(exchange, market)).ok_or_else(|| {
            MarketError::InvalidRequest(format!("{} {} market is not available", exchange, market))
        })
    }
}

#[async_trait]
impl CandleProvider for CandleService {
    /// # Summary
    /// 执行一次完整的 K 线查询。
    ///
    /// # Logic
    /// 1. 选择数据源并确认其提供所请求的周期。
    /// 2. 解析时间区间；空区间直接返回空序列，不访问上游。
    /// 3. 确定交易对：显式 `symbol` 优先，否则由资产名称映射。
    /// 4. 分页采集并归一化。
    async fn fetch_candles(&self, query: CandleQuery) -> Result<CandleSeries, MarketError> {
        let source = self.source(query.exchange, query.market)?;
        if !source.supports(query.interval) {
            return Err(MarketError::UnsupportedInterval(format!(
                "{} is not offered by {}",
                query.interval,
                source.name()
            )));
        }

        let range = self.calendar.resolve(&query.range)?;
        let symbol = match query.symbol.as_deref().map(str::trim) {
            Some(symbol) if !symbol.is_empty() => symbol.to_uppercase(),
            _ => source.symbol_for(&query.instrument_name),
        };

        info!(
            upstream = source.name(),
            symbol = %symbol,
            interval = %query.interval,
            start = range.start_ms,
            end = range.end_ms,
            "candle request received"
        );

        let mut series = CandleSeries {
            exchange: query.exchange,
            market: query.market,
            symbol,
            interval: query.interval,
            range,
            candles: Vec::new(),
        };
        if range.is_empty() {
            return Ok(series);
        }

        let rows = self
            .collector
            .collect(source.as_ref(), &series.symbol, query.interval, range)
            .await
            .inspect_err(|e| error!(upstream = source.name(), symbol = %series.symbol, error = %e, "collection failed"))?;
        let raw_rows = rows.len();
        series.candles = normalize(rows, source.layout())?;

        info!(
            upstream = source.name(),
            symbol = %series.symbol,
            raw_rows,
            candles = series.candles.len(),
            "normalization finished"
        );
        Ok(series)
    }
}
