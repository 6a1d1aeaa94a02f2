//! 外部改写服务客户端
//!
//! 改写服务是显式注入的依赖（单方法接口），调度器只持有
//! `Arc<dyn Transformer>`，测试里可以替换成确定性的假实现。
//! 生产实现调用 Anthropic Messages API，把维基百科片段改写成
//! Z世代口吻，要求保留全部链接与HTML结构、只改动文字。

use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::rewrite::error::{RewriteError, RewriteResult};

/// 外部改写服务接口
///
/// 输入输出都是 HTML 片段字符串；失败由调用方按任务隔离策略兜底。
pub trait Transformer: Send + Sync {
    fn transform<'a>(&'a self, html: &'a str) -> BoxFuture<'a, RewriteResult<String>>;
}

const SYSTEM_PROMPT: &str = "\
Your job is to re-write wikipedia articles for a Gen Z audience. You should rewrite the article
using colloquial Gen Z slang and simpler modern language.

Common Gen Z slang terms:

Rizz - Short for charisma, this refers to skill in charming or attracting someone.
No cap - Means \"no lie\" or \"for real,\" used to emphasize truthfulness.
Sus - Short for \"suspicious,\" used for something or someone that seems untrustworthy.
Cheugy - A term for something outdated, uncool, or a bit cringey, often used to describe millennial trends.
Bussin' - Describes something as delicious or really good.
Slaps - Means something is excellent or impressive, like a great song or meal.
Bet - An expression of agreement or confirmation, similar to \"okay\" or \"deal\".
Drip - Refers to a person's cool style or outfit.
Delulu - A shortened, often humorous term for \"delusional,\" used for someone with unrealistic or overly optimistic beliefs.
Salty - Describes someone who is angry, bitter, or upset over something minor.
Highkey / Lowkey - \"Highkey\" means very or definitely, while \"lowkey\" means slightly or kind of.
Periodt - An emphasized period at the end of a statement to add finality and emphasis.

You will be given a snippet of HTML wikipedia content and you should rewrite it for a Gen Z audience.

<IMPORTANT>
You must preserve all the links and HTML elements of the content. Only the words should be changed.
You must only reply with the updated HTML content and nothing else.
</IMPORTANT>";

/// Messages API 请求体
#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

/// Messages API 响应体（只取文本块）
#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// 基于 Claude 的生产实现
///
/// HTTP 客户端进程级复用，跨请求的并发任务只读共享。
pub struct ClaudeTransformer {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ClaudeTransformer {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// 调用改写服务，带重试与指数退避
    ///
    /// 等待时间 = retry_delay_ms * 2^attempt，处理临时网络错误与限流。
    async fn rewrite_content(&self, html_content: &str) -> RewriteResult<String> {
        let mut attempt = 0;
        let max_attempts = self.config.max_retry_attempts.max(1);

        loop {
            match self.call_api(html_content).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        return Err(RewriteError::TransformTask(format!(
                            "改写失败，已重试 {} 次: {}",
                            max_attempts, e
                        )));
                    }

                    let delay =
                        Duration::from_millis(self.config.retry_delay_ms * (1 << attempt));
                    tracing::warn!(
                        "改写调用失败，{}ms后重试 (尝试 {}/{}): {}",
                        delay.as_millis(),
                        attempt + 1,
                        max_attempts,
                        e
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// 单次 Messages API 调用
    async fn call_api(&self, html_content: &str) -> RewriteResult<String> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: format!("Re-write this HTML content for Gen Z:\n\n{}", html_content),
            }],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| RewriteError::TransformTask(format!("网络错误: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RewriteError::TransformTask(format!(
                "改写服务返回 {}: {}",
                status, detail
            )));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| RewriteError::TransformTask(format!("响应解析失败: {}", e)))?;

        Ok(body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect())
    }
}

impl Transformer for ClaudeTransformer {
    fn transform<'a>(&'a self, html: &'a str) -> BoxFuture<'a, RewriteResult<String>> {
        Box::pin(self.rewrite_content(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_expected_shape() {
        let request = MessagesRequest {
            model: "claude-haiku-4-5-20251001",
            max_tokens: 100,
            temperature: 0.7,
            system: "sys",
            messages: vec![Message {
                role: "user",
                content: "hello".to_string(),
            }],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "claude-haiku-4-5-20251001");
        assert_eq!(value["max_tokens"], 100);
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_joins_text_blocks() {
        let body: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"<p>a</p>"},{"type":"text","text":"<p>b</p>"}]}"#,
        )
        .unwrap();
        let text: String = body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();
        assert_eq!(text, "<p>a</p><p>b</p>");
    }
}
