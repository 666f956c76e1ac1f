use thiserror::Error;

/// # Summary
/// K 线领域错误枚举，覆盖输入校验、上游抓取与数据解析。
///
/// # Invariants
/// - 采集与归一化阶段只向上传播错误，不吞掉任何错误。
/// - HTTP 状态码的映射只在 API 层完成。
#[derive(Error, Debug)]
pub enum MarketError {
    // 日期或时间戳格式不符
    #[error("date must be YYYY-MM-DD: '{0}'")]
    MalformedDate(String),
    // 周期写法未知，或所选上游不提供该周期
    #[error("Unsupported interval: {0}")]
    UnsupportedInterval(String),
    // 其余请求参数错误 (缺参、未知市场或交易所等)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    // 请求区间需要的分页数超过上限
    #[error("Requested range needs more than {max_pages} upstream pages, narrow the range")]
    RangeTooLarge { max_pages: usize },
    // 上游传输失败、超时或返回非成功响应，携带上游原始信息
    #[error("Upstream fetch error: {0}")]
    UpstreamFetch(String),
    // 上游返回的数据形态与布局表不符
    #[error("Parse error: {0}")]
    Parse(String),
}
