// 集成测试公共模块
//
// 提供维基页面构造工具与确定性的假改写服务

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;

use zoomerpedia::config::RewriteConfig;
use zoomerpedia::llm::Transformer;
use zoomerpedia::rewrite::error::{RewriteError, RewriteResult};
use zoomerpedia::rewrite::RewritePipeline;

/// 假改写服务在载荷末尾追加的处理标记
pub const PROCESSED_MARK: &str = "<!-- PROCESSED -->";

/// 维基风格页面构造器
pub struct PageBuilder {
    body: String,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self {
            body: String::new(),
        }
    }

    /// 引言内容（首个标题之前）
    pub fn intro(mut self, html: &str) -> Self {
        self.body.push_str(html);
        self
    }

    /// 追加一个标题章节
    pub fn section(mut self, title: &str, html: &str) -> Self {
        self.body.push_str(&format!(
            "<div class=\"mw-heading mw-heading2\"><h2>{}</h2></div>{}",
            title, html
        ));
        self
    }

    /// 包上正文容器，生成完整页面
    pub fn build(self) -> Vec<u8> {
        format!(
            "<html><head><title>Test</title></head><body>\
             <div id=\"mw-content-text\"><div class=\"mw-parser-output\">{}</div></div>\
             </body></html>",
            self.body
        )
        .into_bytes()
    }
}

/// 生成指定可见文本长度的段落HTML
pub fn paragraph_of_len(len: usize) -> String {
    format!("<p>{}</p>", "a".repeat(len))
}

/// 确定性假改写服务
///
/// 在载荷末尾追加处理标记；可指定第几次调用失败，用于失败隔离场景。
pub struct MockTransformer {
    pub calls: AtomicUsize,
    fail_on_call: Option<usize>,
}

impl MockTransformer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on_call: None,
        }
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on_call: Some(call),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transformer for MockTransformer {
    fn transform<'a>(&'a self, html: &'a str) -> BoxFuture<'a, RewriteResult<String>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Box::pin(async move {
            if self.fail_on_call == Some(call) {
                return Err(RewriteError::TransformTask("simulated failure".to_string()));
            }
            Ok(format!("{}{}", html, PROCESSED_MARK))
        })
    }
}

/// 吞掉批次分隔标记的假服务，模拟生成式服务破坏结构边界
pub struct MarkerEater;

impl Transformer for MarkerEater {
    fn transform<'a>(&'a self, _html: &'a str) -> BoxFuture<'a, RewriteResult<String>> {
        Box::pin(async { Ok("<p>merged output without markers</p>".to_string()) })
    }
}

/// 用默认阈值构造管道
pub fn make_pipeline(transformer: Arc<dyn Transformer>) -> Arc<RewritePipeline> {
    Arc::new(RewritePipeline::new(RewriteConfig::default(), transformer))
}
