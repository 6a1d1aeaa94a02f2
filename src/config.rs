//! 代理配置管理模块
//!
//! 提供统一的配置接口，支持配置文件、环境变量和默认值

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::rewrite::error::{RewriteError, RewriteResult};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 段落分类相关
    pub const TINY_SECTION_THRESHOLD: usize = 50;
    pub const SMALL_SECTION_THRESHOLD: usize = 500;
    pub const MAX_BATCH_SECTIONS: usize = 5;

    // 调度相关
    pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 10;
    pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(60);

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
    pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
    pub const DEFAULT_MAX_TOKENS: usize = 60000;
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    pub const DEFAULT_MAX_RETRY_ATTEMPTS: usize = 3;
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

    // 上游站点设置
    pub const DEFAULT_UPSTREAM_BASE: &str = "https://en.wikipedia.org";
    pub const DEFAULT_MEDIA_BASE: &str = "https://upload.wikimedia.org";
    pub const MEDIA_NAMESPACE: &str = "wikimedia";
    pub const DEFAULT_DOCUMENT_PATH: &str = "/wiki/Main_Page";

    // 服务器设置
    pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8000;
    pub const DEFAULT_PUBLIC_ORIGIN: &str = "localhost:8000";

    // Wikipedia 会拒绝没有浏览器 User-Agent 的请求
    pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    // 跳过改写的样板章节标题（小写匹配）
    pub const SKIP_HEADINGS: &[&str] = &[
        "references",
        "notes",
        "bibliography",
        "citations",
        "footnotes",
        "external links",
        "see also",
        "further reading",
        "sources",
        "works cited",
        "general references",
        "general bibliography",
        "selected bibliography",
    ];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "zoomerpedia.toml",
        ".zoomerpedia.toml",
        "/etc/zoomerpedia/config.toml",
    ];
}

/// 代理服务配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    // 服务器配置
    pub bind_addr: String,
    pub port: u16,
    /// 对外可见的 host:port，URL 重写时指向它
    pub public_origin: String,

    // 上游配置
    pub upstream_base: String,
    pub media_base: String,
    pub user_agent: String,

    // 改写管道配置
    #[serde(default)]
    pub rewrite: RewriteConfig,

    // 外部改写服务配置
    #[serde(default)]
    pub llm: LlmConfig,
}

/// 章节改写管道配置
///
/// 阈值是经验值而非架构常量，可通过配置文件或环境变量调整。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RewriteConfig {
    pub enabled: bool,
    /// 可见文本低于该字符数的段落直接跳过
    pub tiny_threshold: usize,
    /// 可见文本低于该字符数的段落参与合批
    pub small_threshold: usize,
    /// 单个批次最多折叠的段落数
    pub max_batch_sections: usize,
    /// 同时在途的外部调用上限
    pub max_concurrent_requests: usize,
    /// 单个任务的处理超时（秒）
    pub task_timeout_secs: u64,
}

/// 外部改写服务（LLM）配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub api_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub max_retry_attempts: usize,
    pub retry_delay_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_addr: constants::DEFAULT_BIND_ADDR.to_string(),
            port: constants::DEFAULT_PORT,
            public_origin: constants::DEFAULT_PUBLIC_ORIGIN.to_string(),
            upstream_base: constants::DEFAULT_UPSTREAM_BASE.to_string(),
            media_base: constants::DEFAULT_MEDIA_BASE.to_string(),
            user_agent: constants::DEFAULT_USER_AGENT.to_string(),
            rewrite: RewriteConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tiny_threshold: constants::TINY_SECTION_THRESHOLD,
            small_threshold: constants::SMALL_SECTION_THRESHOLD,
            max_batch_sections: constants::MAX_BATCH_SECTIONS,
            max_concurrent_requests: constants::DEFAULT_MAX_CONCURRENT_REQUESTS,
            task_timeout_secs: constants::DEFAULT_TASK_TIMEOUT.as_secs(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: constants::DEFAULT_MODEL.to_string(),
            max_tokens: constants::DEFAULT_MAX_TOKENS,
            temperature: constants::DEFAULT_TEMPERATURE,
            max_retry_attempts: constants::DEFAULT_MAX_RETRY_ATTEMPTS,
            retry_delay_ms: constants::DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl ProxyConfig {
    /// 加载配置：配置文件 -> 环境变量覆盖 -> 校验
    pub fn load() -> RewriteResult<Self> {
        let mut config = Self::load_from_file().unwrap_or_else(|| {
            tracing::debug!("未找到配置文件，使用默认配置");
            Self::default()
        });

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// 从固定搜索路径读取第一个存在的配置文件
    fn load_from_file() -> Option<Self> {
        for path in constants::CONFIG_PATHS {
            if !std::path::Path::new(path).exists() {
                continue;
            }

            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => {
                        tracing::info!("已加载配置文件: {}", path);
                        return Some(config);
                    }
                    Err(e) => {
                        tracing::warn!("配置文件 {} 解析失败，跳过: {}", path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("配置文件 {} 读取失败，跳过: {}", path, e);
                }
            }
        }

        None
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("ZOOMERPEDIA_BIND_ADDR") {
            self.bind_addr = addr;
        }

        if let Ok(port) = std::env::var("ZOOMERPEDIA_PORT") {
            if let Ok(port) = port.parse() {
                self.port = port;
            }
        }

        if let Ok(origin) = std::env::var("ZOOMERPEDIA_PUBLIC_ORIGIN") {
            self.public_origin = origin;
        }

        if let Ok(base) = std::env::var("ZOOMERPEDIA_UPSTREAM_BASE") {
            self.upstream_base = base;
        }

        if let Ok(enabled) = std::env::var("ZOOMERPEDIA_REWRITE_ENABLED") {
            self.rewrite.enabled = matches!(enabled.as_str(), "1" | "true" | "yes");
        }

        if let Ok(workers) = std::env::var("ZOOMERPEDIA_MAX_CONCURRENT_REQUESTS") {
            if let Ok(workers) = workers.parse() {
                self.rewrite.max_concurrent_requests = workers;
            }
        }

        if let Ok(model) = std::env::var("ZOOMERPEDIA_MODEL") {
            self.llm.model = model;
        }

        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.llm.api_key = key;
        }
    }

    /// 校验配置
    pub fn validate(&self) -> RewriteResult<()> {
        if self.public_origin.is_empty() {
            return Err(RewriteError::Config("public_origin 不能为空".to_string()));
        }

        url::Url::parse(&self.upstream_base)
            .map_err(|e| RewriteError::Config(format!("upstream_base 无效: {}", e)))?;
        url::Url::parse(&self.media_base)
            .map_err(|e| RewriteError::Config(format!("media_base 无效: {}", e)))?;

        if self.rewrite.max_batch_sections == 0 {
            return Err(RewriteError::Config("批次段落上限不能为0".to_string()));
        }

        if self.rewrite.max_concurrent_requests == 0 {
            return Err(RewriteError::Config("最大并发数不能为0".to_string()));
        }

        if self.rewrite.tiny_threshold >= self.rewrite.small_threshold {
            return Err(RewriteError::Config(
                "tiny_threshold 必须小于 small_threshold".to_string(),
            ));
        }

        Ok(())
    }
}

impl RewriteConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ProxyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rewrite.tiny_threshold, 50);
        assert_eq!(config.rewrite.small_threshold, 500);
        assert_eq!(config.rewrite.max_batch_sections, 5);
    }

    #[test]
    fn test_validate_rejects_zero_batch_cap() {
        let mut config = ProxyConfig::default();
        config.rewrite.max_batch_sections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = ProxyConfig::default();
        config.rewrite.tiny_threshold = 600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_invalid_upstream_url() {
        let mut config = ProxyConfig::default();
        config.upstream_base = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let config = ProxyConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: ProxyConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.port, config.port);
        assert_eq!(
            parsed.rewrite.small_threshold,
            config.rewrite.small_threshold
        );
    }
}
