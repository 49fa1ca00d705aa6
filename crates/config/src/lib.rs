//! 统一配置中心
//!
//! 提供应用的全局配置管理，包括：
//! - HTTP 服务
//! - Redis 计数存储
//! - 存储重试策略
//! - 报表窗口与参考时区
//!
//! 加载顺序：默认值 -> 可选配置文件（`EMOJI_REPORT_CONFIG`）-> 环境变量（`APP_*`，`__` 分隔层级）。

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// 指定配置文件路径的环境变量
pub const CONFIG_FILE_ENV: &str = "EMOJI_REPORT_CONFIG";

/// 全局应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// Redis配置
    #[serde(default)]
    pub redis: RedisConfig,
    /// 计数存储配置
    #[serde(default)]
    pub store: StoreConfig,
    /// 重试配置
    #[serde(default)]
    pub retry: RetrySettings,
    /// 报表配置
    #[serde(default)]
    pub report: ReportConfig,
}

/// 服务器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Redis配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    /// 所有计数键的前缀
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "reactions".to_string(),
        }
    }
}

/// 计数存储配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// 单日单次读取的记录上限
    pub page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { page_size: 1000 }
    }
}

/// 存储往返的重试策略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    /// 整个重试循环的截止时间，不设置则只受次数限制
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 300,
            deadline_ms: None,
        }
    }
}

/// 报表配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub default_days: u32,
    pub max_days: u32,
    /// 每个报表展示的条目数
    pub top_n: usize,
    /// 参考时区相对 UTC 的偏移（秒）
    pub utc_offset_seconds: i32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_days: 7,
            max_days: 999,
            top_n: 10,
            utc_offset_seconds: 0,
        }
    }
}

impl AppConfig {
    /// 按默认值 -> 配置文件 -> 环境变量的顺序加载并校验
    pub fn load() -> Result<Self, ConfigError> {
        let mut fig = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                fig = fig.merge(Yaml::file(path));
            } else if path.ends_with(".json") {
                fig = fig.merge(Json::file(path));
            } else {
                fig = fig.merge(Toml::file(path));
            }
        }
        fig = fig.merge(Env::prefixed("APP_").split("__"));
        Self::from_figment(fig)
    }

    /// 从任意 figment 提取并校验
    pub fn from_figment(fig: Figment) -> Result<Self, ConfigError> {
        let cfg: AppConfig = fig
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::InvalidServerConfig(
                "host cannot be empty".to_string(),
            ));
        }

        if self.redis.url.is_empty() {
            return Err(ConfigError::InvalidRedisConfig(
                "Redis URL cannot be empty".to_string(),
            ));
        }
        if self.redis.key_prefix.is_empty() {
            return Err(ConfigError::InvalidRedisConfig(
                "key prefix cannot be empty".to_string(),
            ));
        }

        if self.store.page_size == 0 {
            return Err(ConfigError::InvalidStoreConfig(
                "page size must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidRetryConfig(
                "max attempts must be greater than 0".to_string(),
            ));
        }
        if self.retry.deadline_ms == Some(0) {
            return Err(ConfigError::InvalidRetryConfig(
                "deadline must be greater than 0 when set".to_string(),
            ));
        }

        if self.report.default_days == 0 || self.report.max_days == 0 {
            return Err(ConfigError::InvalidReportConfig(
                "window days must be greater than 0".to_string(),
            ));
        }
        if self.report.default_days > self.report.max_days {
            return Err(ConfigError::InvalidReportConfig(format!(
                "default window {} exceeds max window {}",
                self.report.default_days, self.report.max_days
            )));
        }
        if self.report.top_n == 0 {
            return Err(ConfigError::InvalidReportConfig(
                "top_n must be greater than 0".to_string(),
            ));
        }
        // chrono::FixedOffset 只接受 (-86400, 86400)
        if self.report.utc_offset_seconds.abs() >= 86_400 {
            return Err(ConfigError::InvalidReportConfig(format!(
                "utc offset {}s is out of range",
                self.report.utc_offset_seconds
            )));
        }

        Ok(())
    }

    /// 用于日志输出的配置摘要（去掉 Redis URL 中的凭据）
    pub fn sanitize(&self) -> String {
        let redis = match self.redis.url.split_once('@') {
            Some((scheme_and_auth, host)) => {
                let scheme = scheme_and_auth.split("://").next().unwrap_or("redis");
                format!("{scheme}://***@{host}")
            }
            None => self.redis.url.clone(),
        };
        format!(
            "server={}:{} redis={} prefix={} page_size={} retry={}x{}ms report_days={} offset={}s",
            self.server.host,
            self.server.port,
            redis,
            self.redis.key_prefix,
            self.store.page_size,
            self.retry.max_attempts,
            self.retry.base_delay_ms,
            self.report.default_days,
            self.report.utc_offset_seconds,
        )
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
    #[error("Invalid Redis configuration: {0}")]
    InvalidRedisConfig(String),
    #[error("Invalid store configuration: {0}")]
    InvalidStoreConfig(String),
    #[error("Invalid retry configuration: {0}")]
    InvalidRetryConfig(String),
    #[error("Invalid report configuration: {0}")]
    InvalidReportConfig(String),
}
