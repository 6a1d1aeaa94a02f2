//! # Zoomerpedia
//!
//! 一个反向HTTP代理：代理 Wikipedia 站点，把页面里的资源地址重写到
//! 代理自身的源，并通过外部生成式改写服务把正文内容改写成 Z 世代
//! 口吻后返回给客户端。
//!
//! ## 模块组织
//!
//! - `config` - 配置加载与常量
//! - `parsers` - HTML 解析、遍历与序列化
//! - `rewrite` - 章节改写管道（分段/分类/调度/编解码/重组）
//! - `llm` - 外部改写服务客户端
//! - `proxy` - 转发策略与URL重写
//! - `network` - 上游文档获取
//! - `web` - HTTP 监听与路由分发

pub mod config;
pub mod llm;
pub mod network;
pub mod parsers;
pub mod proxy;
pub mod rewrite;
pub mod web;

// Re-export commonly used items for convenience
pub use config::ProxyConfig;
pub use rewrite::RewritePipeline;
pub use web::WebServer;
