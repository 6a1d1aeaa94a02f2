//! 段落分类器
//!
//! 纯函数：把有序段落列表映射为任务列表。规则按文档顺序逐段匹配，
//! 先命中先生效：
//!
//! 1. **跳过** — 标题在样板章节集合里（参考文献、外部链接等），或可见
//!    文本少于 `tiny_threshold`。跳过的段落原样保留，绝不外发。
//! 2. **合批** — 可见文本少于 `small_threshold` 的段落向后贪心扩展
//!    窗口，最多折叠 `max_batch_sections` 段；窗口只剩一段时退化为
//!    单独任务（合批只对≥2段有收益）。
//! 3. **单独** — 其余段落各自成为一个任务。
//!
//! 保证：每个段落恰好出现在一个任务里；任务顺序按其覆盖的最小段落
//! 下标不减。

use crate::config::{constants, RewriteConfig};
use crate::rewrite::segmenter::Segment;

/// 提交给外部改写服务的调度单位
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformTask {
    /// 原样保留，不外发
    Skip { index: usize, html: String },
    /// 单段独立调用
    Individual { index: usize, html: String },
    /// 多段折叠为一次调用（至少两段），编码由批次编解码器负责
    Batch { pieces: Vec<(usize, String)> },
}

impl TransformTask {
    /// 任务覆盖的段落下标（升序）
    pub fn indices(&self) -> Vec<usize> {
        match self {
            TransformTask::Skip { index, .. } | TransformTask::Individual { index, .. } => {
                vec![*index]
            }
            TransformTask::Batch { pieces } => pieces.iter().map(|(index, _)| *index).collect(),
        }
    }
}

/// 判断段落是否跳过改写
///
/// 样板标题不看长度，一律跳过；其余段落按可见文本长度判断。
pub fn should_skip_segment(heading_text: &str, text_length: usize, config: &RewriteConfig) -> bool {
    let heading = heading_text.trim().to_lowercase();
    if constants::SKIP_HEADINGS.contains(&heading.as_str()) {
        return true;
    }

    text_length < config.tiny_threshold
}

/// 把段落列表分类为任务列表
pub fn classify_segments(segments: &[Segment], config: &RewriteConfig) -> Vec<TransformTask> {
    let skip: Vec<bool> = segments
        .iter()
        .map(|segment| should_skip_segment(&segment.heading_text, segment.text_length, config))
        .collect();

    let mut tasks = Vec::with_capacity(segments.len());
    let mut position = 0;

    while position < segments.len() {
        let segment = &segments[position];

        if skip[position] {
            tasks.push(TransformTask::Skip {
                index: segment.index,
                html: segment.html.clone(),
            });
            position += 1;
            continue;
        }

        if segment.text_length < config.small_threshold {
            // 贪心向后收集连续的小段落
            let mut pieces = Vec::new();
            while position < segments.len()
                && pieces.len() < config.max_batch_sections
                && !skip[position]
                && segments[position].text_length < config.small_threshold
            {
                pieces.push((segments[position].index, segments[position].html.clone()));
                position += 1;
            }

            if pieces.len() >= 2 {
                tasks.push(TransformTask::Batch { pieces });
            } else {
                let (index, html) = pieces.remove(0);
                tasks.push(TransformTask::Individual { index, html });
            }
            continue;
        }

        tasks.push(TransformTask::Individual {
            index: segment.index,
            html: segment.html.clone(),
        });
        position += 1;
    }

    tasks
}
