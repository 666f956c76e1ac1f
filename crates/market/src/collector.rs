use kandle_core::common::Interval;
use kandle_core::market::entity::{FetchRange, RawKline};
use kandle_core::market::error::MarketError;
use kandle_core::market::port::{KlineSource, PageRequest};
use tracing::{debug, warn};

/// # Summary
/// 分页采集器：在上游单页行数上限的约束下，顺序抓取覆盖整个区间的原始 K 线。
///
/// # Invariants
/// - 同一请求内的上游调用严格串行，下一页参数依赖上一页结果。
/// - 任意一页失败即整体失败，已抓取的部分结果被丢弃。
/// - 页数超过 `max_pages` 时中止，保证最坏情况下的耗时有界。
#[derive(Debug, Clone, Copy)]
pub struct PageCollector {
    max_pages: usize,
}

impl PageCollector {
    pub fn new(max_pages: usize) -> Self {
        Self { max_pages }
    }

    /// # Summary
    /// 抓取 `range` 内的全部原始行。
    ///
    /// # Logic
    /// 1. 游标从区间起点开始，每页请求 `[cursor, min(end, cursor + interval * (limit - 1))]`。
    /// 2. 空页即停止。
    /// 3. 以本页最后一行的开盘时间加一个周期作为下一游标；游标未前进时停止，防止死循环。
    /// 4. 本页不足 `limit` 行说明上游已无更多数据，停止。
    ///
    /// # Arguments
    /// * `source`: 上游数据源。
    /// * `symbol`: 上游交易对代码。
    /// * `interval`: K 线周期。
    /// * `range`: 闭区间，`start > end` 时不发任何请求。
    ///
    /// # Returns
    /// 按抓取顺序拼接的原始行 (可能含重复开盘时间，由归一化处理)。
    pub async fn collect(
        &self,
        source: &dyn KlineSource,
        symbol: &str,
        interval: Interval,
        range: FetchRange,
    ) -> Result<Vec<RawKline>, MarketError> {
        let interval_ms = interval.duration_ms();
        let limit = source.page_limit().max(1);
        let span = i64::try_from(limit - 1)
            .unwrap_or(i64::MAX)
            .saturating_mul(interval_ms);

        let mut rows = Vec::new();
        let mut cursor = range.start_ms;
        let mut pages = 0usize;

        while cursor <= range.end_ms {
            if pages >= self.max_pages {
                warn!(
                    upstream = source.name(),
                    symbol,
                    max_pages = self.max_pages,
                    "page budget exhausted before range end"
                );
                return Err(MarketError::RangeTooLarge {
                    max_pages: self.max_pages,
                });
            }

            let chunk_end = range.end_ms.min(cursor.saturating_add(span));
            let request = PageRequest {
                symbol: symbol.to_string(),
                interval,
                start_ms: cursor,
                end_ms: chunk_end,
                limit,
            };
            let page = source.fetch_page(&request).await?;
            pages += 1;

            let page_len = page.len();
            let Some(last_open) = page.last().map(|row| row.open_time) else {
                debug!(upstream = source.name(), symbol, cursor, "empty page, stop");
                break;
            };
            rows.extend(page);

            let next = last_open.saturating_add(interval_ms);
            if next <= cursor {
                warn!(
                    upstream = source.name(),
                    symbol,
                    cursor,
                    last_open,
                    "cursor did not advance, stop"
                );
                break;
            }
            cursor = next;

            if page_len < limit {
                break;
            }
        }

        debug!(
            upstream = source.name(),
            symbol,
            pages,
            rows = rows.len(),
            "collection finished"
        );
        Ok(rows)
    }
}
