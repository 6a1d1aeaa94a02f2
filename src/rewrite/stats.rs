//! 管道处理统计（线程安全）
//!
//! 所有计数器使用原子操作，进程级共享，用于日志与监控。
//! 任务失败只计入统计，不影响请求结果。

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// 改写管道统计信息
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// 处理过的页面总数
    pub pages_processed: AtomicUsize,
    /// 切分出的段落总数
    pub segments_total: AtomicUsize,
    /// 直接跳过的段落数（样板标题或过短）
    pub segments_skipped: AtomicUsize,
    /// 通过合批外发的段落数
    pub segments_batched: AtomicUsize,
    /// 外发任务总数（不含跳过）
    pub tasks_dispatched: AtomicUsize,
    /// 失败后回退为原文的任务数
    pub tasks_failed: AtomicUsize,
    /// 批次响应解码失败次数
    pub decode_mismatches: AtomicUsize,
    /// 发送给改写服务的字符总数
    pub characters_sent: AtomicUsize,
    /// 从改写服务收到的字符总数
    pub characters_received: AtomicUsize,
    /// 累计处理时间（微秒）
    pub processing_time: AtomicU64,
}

impl PipelineStats {
    pub fn inc_pages_processed(&self) {
        self.pages_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_segments(&self, count: usize) {
        self.segments_total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_segments_skipped(&self, count: usize) {
        self.segments_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_segments_batched(&self, count: usize) {
        self.segments_batched.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_tasks_dispatched(&self, count: usize) {
        self.tasks_dispatched.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_tasks_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_decode_mismatches(&self) {
        self.decode_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_characters_sent(&self, count: usize) {
        self.characters_sent.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_characters_received(&self, count: usize) {
        self.characters_received.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_processing_time(&self, duration: Duration) {
        self.processing_time
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// 人类可读的摘要，用于页面处理完成后的日志
    pub fn summary(&self) -> String {
        format!(
            "pages={} segments={} skipped={} batched={} dispatched={} failed={}",
            self.pages_processed.load(Ordering::Relaxed),
            self.segments_total.load(Ordering::Relaxed),
            self.segments_skipped.load(Ordering::Relaxed),
            self.segments_batched.load(Ordering::Relaxed),
            self.tasks_dispatched.load(Ordering::Relaxed),
            self.tasks_failed.load(Ordering::Relaxed),
        )
    }
}
