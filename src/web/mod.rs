//! Web 服务器模块
//!
//! HTTP 监听与路由分发：根路径重定向、媒体与内容页的统一代理
//! 入口、兜底 404。

pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::llm::{ClaudeTransformer, Transformer};
use crate::network::UpstreamClient;
use crate::rewrite::error::{RewriteError, RewriteResult};
use crate::rewrite::RewritePipeline;
use types::AppState;

/// Web 服务器
pub struct WebServer {
    config: ProxyConfig,
}

impl WebServer {
    /// 创建新的 Web 服务器
    pub fn new(config: ProxyConfig) -> Self {
        Self { config }
    }

    /// 启动 Web 服务器
    pub async fn start(&self) -> RewriteResult<()> {
        let transformer: Arc<dyn Transformer> =
            Arc::new(ClaudeTransformer::new(self.config.llm.clone()));
        let pipeline = Arc::new(RewritePipeline::new(
            self.config.rewrite.clone(),
            transformer,
        ));
        let upstream = UpstreamClient::new(&self.config.user_agent);

        let app_state = Arc::new(AppState {
            config: self.config.clone(),
            upstream,
            pipeline,
        });

        let app = create_router(app_state);

        let listener = tokio::net::TcpListener::bind(format!(
            "{}:{}",
            self.config.bind_addr, self.config.port
        ))
        .await
        .map_err(|e| RewriteError::Internal(format!("Failed to bind server: {}", e)))?;

        tracing::info!(
            "代理服务启动: http://{}:{}",
            self.config.bind_addr,
            self.config.port
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| RewriteError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}

/// 创建路由器
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/*path", get(handlers::proxy))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
