use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub market: MarketConfig,
    pub upstreams: UpstreamConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// K 线抓取相关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// 解释 `YYYY-MM-DD` 时使用的本地时区偏移 (小时)
    pub utc_offset_hours: i32,
    /// 单次上游请求超时 (秒)
    pub request_timeout_secs: u64,
    /// 单个请求允许的最大分页数
    pub max_pages: usize,
    /// 可选的 Binance API Key，公开行情接口不强制要求
    pub binance_api_key: Option<String>,
}

/// 各上游的基础 URL，测试或代理部署时可覆盖
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub binance_spot: String,
    pub binance_futures: String,
    pub bybit: String,
    pub okx: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 未设置 `RUST_LOG` 时使用的过滤级别
    pub level: String,
    /// 设置后按天滚动写入该目录
    pub dir: Option<String>,
}

/// 配置校验错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("market.utc_offset_hours must be within -14..=14, got {0}")]
    OffsetOutOfRange(i32),
    #[error("market.request_timeout_secs must be positive")]
    ZeroTimeout,
    #[error("market.max_pages must be positive")]
    ZeroMaxPages,
}

impl AppConfig {
    /// # Summary
    /// 校验配置取值。
    ///
    /// # Returns
    /// 第一处不合法的取值对应的 `ConfigError`。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-14..=14).contains(&self.market.utc_offset_hours) {
            return Err(ConfigError::OffsetOutOfRange(self.market.utc_offset_hours));
        }
        if self.market.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.market.max_pages == 0 {
            return Err(ConfigError::ZeroMaxPages);
        }
        Ok(())
    }

    /// 监听地址，例如 `0.0.0.0:10000`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 10000,
            },
            market: MarketConfig {
                utc_offset_hours: 4,
                request_timeout_secs: 20,
                max_pages: 500,
                binance_api_key: None,
            },
            upstreams: UpstreamConfig {
                binance_spot: "https://api.binance.com".to_string(),
                binance_futures: "https://fapi.binance.com".to_string(),
                bybit: "https://api.bybit.com".to_string(),
                okx: "https://www.okx.com".to_string(),
            },
            log: LogConfig {
                level: "info".to_string(),
                dir: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:10000");
        assert_eq!(config.market.utc_offset_hours, 4);
        assert_eq!(config.market.request_timeout_secs, 20);
        assert!(config.market.binance_api_key.is_none());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.market.utc_offset_hours = 20;
        assert_eq!(config.validate(), Err(ConfigError::OffsetOutOfRange(20)));

        let mut config = AppConfig::default();
        config.market.request_timeout_secs = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));

        let mut config = AppConfig::default();
        config.market.max_pages = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxPages));
    }
}
