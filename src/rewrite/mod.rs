//! # 章节改写管道
//!
//! 管道把一张已获取的页面按语义单元改写：分段 -> 分类 -> 并发调度
//! -> 批次编解码 -> 原位重组。单个请求独占一棵DOM树；rcdom 句柄不可
//! 跨线程，DOM 相关阶段整体放在阻塞线程上执行，只在外部调用边界
//! 回到异步运行时（`spawn_blocking` + `block_on`）。
//!
//! 模块组织：
//!
//! - `segmenter` - 文档分段器
//! - `classifier` - 段落分类器
//! - `dispatcher` - 并发任务调度器
//! - `codec` - 批次编解码器
//! - `reassembler` - 文档重组器
//! - `error` / `stats` - 错误类型与统计

pub mod classifier;
pub mod codec;
pub mod dispatcher;
pub mod error;
pub mod reassembler;
pub mod segmenter;
pub mod stats;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task;

use crate::config::RewriteConfig;
use crate::llm::Transformer;
use crate::parsers::html::{html_to_dom, serialize_document};
use crate::proxy::urls::rewrite_urls;

use classifier::{classify_segments, TransformTask};
use dispatcher::dispatch_tasks;
use error::{RewriteError, RewriteResult};
use reassembler::reassemble_document;
use segmenter::segment_document;
use stats::PipelineStats;

/// 判断响应是否为HTML
pub fn content_type_is_html(content_type: Option<&str>) -> bool {
    content_type
        .map(|value| value.contains("text/html"))
        .unwrap_or(false)
}

/// 判断路径是否为内容页面
///
/// 只有 wiki/ 前缀的条目页参与改写；带命名空间分隔符的页面
/// （Special:、File: 等管理页）一律跳过。
pub fn is_article_path(path: &str) -> bool {
    (path.starts_with("/wiki/") || path.starts_with("wiki/")) && !path.contains(':')
}

/// 章节改写管道
///
/// 改写服务通过 `Arc<dyn Transformer>` 注入；信号量与统计为进程级，
/// 在全部并发请求之间共享。
pub struct RewritePipeline {
    config: RewriteConfig,
    transformer: Arc<dyn Transformer>,
    limiter: Arc<Semaphore>,
    stats: Arc<PipelineStats>,
}

impl RewritePipeline {
    pub fn new(config: RewriteConfig, transformer: Arc<dyn Transformer>) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests));

        Self {
            config,
            transformer,
            limiter,
            stats: Arc::new(PipelineStats::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// 改写一张完整的文章页面
    ///
    /// DOM 阶段在阻塞线程上执行；对外部服务的并发调度通过
    /// `Handle::block_on` 驱动。
    pub async fn rewrite_article(self: Arc<Self>, content: Vec<u8>) -> RewriteResult<Vec<u8>> {
        task::spawn_blocking(move || self.rewrite_article_blocking(content))
            .await
            .map_err(|e| RewriteError::Internal(format!("改写任务执行失败: {}", e)))?
    }

    fn rewrite_article_blocking(&self, content: Vec<u8>) -> RewriteResult<Vec<u8>> {
        let start = Instant::now();

        let dom = html_to_dom(&content, "utf-8".to_string());
        let segments = segment_document(&dom)?;
        self.stats.add_segments(segments.len());

        let tasks = classify_segments(&segments, &self.config);

        let skipped = tasks
            .iter()
            .filter(|task| matches!(task, TransformTask::Skip { .. }))
            .count();
        let batched: usize = tasks
            .iter()
            .filter_map(|task| match task {
                TransformTask::Batch { pieces } => Some(pieces.len()),
                _ => None,
            })
            .sum();
        let dispatched = tasks.len() - skipped;

        self.stats.add_segments_skipped(skipped);
        self.stats.add_segments_batched(batched);
        self.stats.add_tasks_dispatched(dispatched);

        tracing::debug!(
            "段落分类完成: {} 段 -> {} 任务 (跳过 {}, 合批 {} 段)",
            segments.len(),
            tasks.len(),
            skipped,
            batched
        );

        let originals: Vec<String> = segments.iter().map(|segment| segment.html.clone()).collect();

        // 并发调度在异步运行时上执行，DOM 留在当前阻塞线程
        let results = tokio::runtime::Handle::current().block_on(dispatch_tasks(
            tasks,
            originals,
            self.transformer.clone(),
            self.limiter.clone(),
            self.config.task_timeout(),
            &self.stats,
        ));

        reassemble_document(&segments, &results)?;

        self.stats.inc_pages_processed();
        self.stats.add_processing_time(start.elapsed());
        tracing::info!(
            "页面改写完成: {} 段, 耗时 {:?} (累计 {})",
            segments.len(),
            start.elapsed(),
            self.stats.summary()
        );

        Ok(serialize_document(dom, "utf-8".to_string()))
    }
}

/// 对一次上游响应执行完整处理流程
///
/// URL 重写对所有HTML无条件执行；章节改写只作用于满足条件的内容
/// 页面。正文容器缺失等结构性错误向上传播，由HTTP层转为错误响应。
pub async fn process_content(
    pipeline: &Arc<RewritePipeline>,
    content: Vec<u8>,
    content_type: Option<&str>,
    path: &str,
    public_origin: &str,
) -> RewriteResult<Vec<u8>> {
    let content = rewrite_urls(content, content_type, public_origin);

    if !content_type_is_html(content_type) {
        return Ok(content);
    }

    if !is_article_path(path) {
        return Ok(content);
    }

    if !pipeline.is_enabled() {
        return Ok(content);
    }

    Arc::clone(pipeline).rewrite_article(content).await
}
