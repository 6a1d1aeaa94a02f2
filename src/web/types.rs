//! Web 模块的共享状态

use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::network::UpstreamClient;
use crate::rewrite::RewritePipeline;

/// 应用状态
///
/// 上游客户端与改写管道都是进程级单例，经由状态注入处理器，
/// 跨请求只读共享。
pub struct AppState {
    pub config: ProxyConfig,
    pub upstream: UpstreamClient,
    pub pipeline: Arc<RewritePipeline>,
}
