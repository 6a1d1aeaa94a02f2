//! 改写管道统一错误处理
//!
//! 区分请求级致命错误与任务级可恢复错误

use thiserror::Error;

/// 改写管道错误类型
#[derive(Error, Debug, Clone)]
pub enum RewriteError {
    /// 页面缺少正文容器，该请求无法改写（致命，不重试）
    #[error("正文容器缺失: {0}")]
    ContentNotFound(String),

    /// 单个改写任务失败（可恢复，回退为原文）
    #[error("改写任务失败: {0}")]
    TransformTask(String),

    /// 批次响应无法按预期段数拆分（可恢复，整批回退为原文）
    #[error("批次解码不匹配: 期望 {expected} 段，得到 {found} 段")]
    BatchDecodeMismatch { expected: usize, found: usize },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 内部错误（文档结构在处理期间被破坏等，理论上不应出现）
    #[error("内部错误: {0}")]
    Internal(String),
}

impl RewriteError {
    /// 任务级错误可恢复：回退为原文即可，绝不向上传播
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RewriteError::TransformTask(_) | RewriteError::BatchDecodeMismatch { .. }
        )
    }
}

/// 错误结果类型别名
pub type RewriteResult<T> = Result<T, RewriteError>;
