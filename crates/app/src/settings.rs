//! 配置加载：内置缺省值 → 配置文件 → `KANDLE__*` 环境变量 → 常用环境变量快捷覆盖。

use config::{Config, ConfigError, Environment, File, Map, Source};
use kandle_core::config::AppConfig;

/// 未设置 `KANDLE_CONFIG` 时读取的配置文件 (可不存在)
pub const DEFAULT_CONFIG_PATH: &str = "config/kandle.toml";

/// # Summary
/// 从进程环境加载配置。
pub fn load() -> Result<AppConfig, ConfigError> {
    let vars: Map<String, String> = std::env::vars().collect();
    let path = vars
        .get("KANDLE_CONFIG")
        .cloned()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    assemble(File::with_name(&path).required(false), vars)
}

/// # Summary
/// 按优先级合并各配置来源。
///
/// # Arguments
/// * `file`: 配置文件来源。
/// * `vars`: 环境变量快照，`PORT` 与 `BINANCE_API_KEY` 优先级最高。
pub fn assemble<S>(file: S, vars: Map<String, String>) -> Result<AppConfig, ConfigError>
where
    S: Source + Send + Sync + 'static,
{
    let port = vars.get("PORT").cloned();
    let api_key = vars.get("BINANCE_API_KEY").cloned();

    Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?)
        .add_source(file)
        .add_source(
            Environment::with_prefix("KANDLE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars)),
        )
        .set_override_option("server.port", port)?
        .set_override_option("market.binance_api_key", api_key)?
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn empty_file() -> File<config::FileSourceString, FileFormat> {
        File::from_str("", FileFormat::Toml)
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = assemble(empty_file(), Map::new()).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:10000");
        assert_eq!(config.market.utc_offset_hours, 4);
        assert_eq!(config.market.max_pages, 500);
        assert_eq!(config.upstreams.okx, "https://www.okx.com");
        assert!(config.log.dir.is_none());
    }

    #[test]
    fn test_layering_order() {
        let file = File::from_str(
            r#"
            [server]
            port = 8080

            [market]
            utc_offset_hours = 3
            max_pages = 50

            [upstreams]
            bybit = "http://127.0.0.1:9000"
            "#,
            FileFormat::Toml,
        );
        let config = assemble(
            file,
            vars(&[
                ("KANDLE__MARKET__MAX_PAGES", "20"),
                ("KANDLE__LOG__LEVEL", "debug"),
                ("PORT", "9999"),
                ("BINANCE_API_KEY", "k-123"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.market.utc_offset_hours, 3);
        assert_eq!(config.market.max_pages, 20);
        assert_eq!(config.market.binance_api_key.as_deref(), Some("k-123"));
        assert_eq!(config.upstreams.bybit, "http://127.0.0.1:9000");
        assert_eq!(config.upstreams.binance_spot, "https://api.binance.com");
        assert_eq!(config.log.level, "debug");
    }
}
