//! # 网络模块
//!
//! 上游文档获取。HTTP 客户端进程级创建一次，连接池跨请求复用，
//! 并发任务只读共享。

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use thiserror::Error;

/// 上游获取错误（请求级致命，直接转为 502 响应）
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Error fetching from Wikipedia: {0}")]
    Transport(#[from] reqwest::Error),
}

/// 一次上游响应
///
/// 非 200 状态不算错误：上游的 404 等页面原样透传给客户端。
pub struct FetchedPage {
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: reqwest::header::HeaderMap,
    pub body: Vec<u8>,
}

/// 上游HTTP客户端
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    default_user_agent: String,
}

impl UpstreamClient {
    pub fn new(default_user_agent: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            default_user_agent: default_user_agent.to_string(),
        }
    }

    /// 获取一个上游URL
    ///
    /// 透传客户端的 User-Agent（缺省时用浏览器样式的默认值），
    /// 自动跟随重定向。
    pub async fn fetch(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<FetchedPage, FetchError> {
        let user_agent = user_agent.unwrap_or(&self.default_user_agent);

        tracing::debug!("抓取上游: {}", url);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body = response.bytes().await?.to_vec();

        Ok(FetchedPage {
            status,
            content_type,
            headers,
            body,
        })
    }
}
