use crate::profile::{RowOrder, UpstreamProfile};
use async_trait::async_trait;
use kandle_core::common::{Exchange, Interval};
use kandle_core::market::entity::RawKline;
use kandle_core::market::error::MarketError;
use kandle_core::market::layout::RowLayout;
use kandle_core::market::port::{KlineSource, PageRequest};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

const BINANCE_API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// # Summary
/// 构建所有上游共享的 HTTP 客户端。
///
/// # Logic
/// 1. 安装 ring 作为 rustls 的进程级加密实现 (已安装时跳过)。
/// 2. 配置单次请求超时。
///
/// # Arguments
/// * `timeout`: 单次上游请求超时，不是整个查询的总时限。
///
/// # Returns
/// 成功返回带连接池的 `reqwest::Client`。
pub fn build_http_client(timeout: Duration) -> Result<Client, MarketError> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("kandle/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| MarketError::UpstreamFetch(format!("failed to build HTTP client: {}", e)))
}

/// # Summary
/// 依据 `UpstreamProfile` 描述表访问某个交易所 K 线接口的数据源。
///
/// # Invariants
/// - 描述表为 `'static`，客户端本身只持有连接池与基础 URL。
/// - 返回的行始终按开盘时间升序排列。
#[derive(Clone)]
pub struct ExchangeClient {
    client: Client,
    base_url: String,
    profile: &'static UpstreamProfile,
    api_key: Option<String>,
}

impl ExchangeClient {
    /// # Summary
    /// 创建数据源实例。
    ///
    /// # Arguments
    /// * `client`: 共享的 HTTP 客户端。
    /// * `profile`: 上游描述表。
    /// * `base_url`: 上游基础地址，例如 `https://api.binance.com`。
    pub fn new(client: Client, profile: &'static UpstreamProfile, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile,
            api_key: None,
        }
    }

    /// 附带 API Key，仅对 Binance 生效
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.profile.path)
    }
}

#[async_trait]
impl KlineSource for ExchangeClient {
    fn name(&self) -> &str {
        self.profile.name
    }

    fn page_limit(&self) -> usize {
        self.profile.page_limit
    }

    fn layout(&self) -> &RowLayout {
        &self.profile.layout
    }

    fn supports(&self, interval: Interval) -> bool {
        self.profile.interval_token(interval).is_some()
    }

    fn symbol_for(&self, instrument_name: &str) -> String {
        self.profile.symbol_for(instrument_name)
    }

    /// # Summary
    /// 抓取一页原始 K 线。
    ///
    /// # Logic
    /// 1. 按描述表构建查询参数，Binance 上游附加 API Key 头。
    /// 2. 发送请求，传输失败或非 2xx 状态一律转为 `UpstreamFetch` 并保留响应体。
    /// 3. 解包响应信封并提取开盘时间。
    /// 4. 倒序上游翻转为升序。
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<RawKline>, MarketError> {
        let params = self.profile.query_params(request)?;

        let mut builder = self.client.get(self.endpoint()).query(&params);
        if self.profile.exchange == Exchange::Binance
            && let Some(key) = &self.api_key
        {
            builder = builder.header(BINANCE_API_KEY_HEADER, key);
        }

        let resp = builder.send().await.map_err(|e| {
            error!(upstream = self.profile.name, symbol = %request.symbol, error = %e, "upstream request failed");
            MarketError::UpstreamFetch(format!("{} request failed: {}", self.profile.name, e))
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            error!(upstream = self.profile.name, %status, error = %e, "upstream body read failed");
            MarketError::UpstreamFetch(format!("{} body read failed: {}", self.profile.name, e))
        })?;

        if !status.is_success() {
            error!(
                upstream = self.profile.name,
                symbol = %request.symbol,
                %status,
                body = %body,
                "upstream returned error status"
            );
            return Err(MarketError::UpstreamFetch(format!(
                "{} returned HTTP {}: {}",
                self.profile.name, status, body
            )));
        }

        let mut rows = self
            .profile
            .unwrap_rows(&body)?
            .into_iter()
            .map(|fields| self.profile.layout.raw(fields))
            .collect::<Result<Vec<_>, _>>()?;

        if self.profile.order == RowOrder::NewestFirst {
            rows.reverse();
        }

        debug!(
            upstream = self.profile.name,
            symbol = %request.symbol,
            start = request.start_ms,
            end = request.end_ms,
            rows = rows.len(),
            "upstream page fetched"
        );
        Ok(rows)
    }
}
