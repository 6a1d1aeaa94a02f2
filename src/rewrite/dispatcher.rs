//! 改写任务调度器
//!
//! 对分类产出的任务列表做一次 scatter-gather：每个任务一个 future，
//! 并发执行，任务之间没有顺序依赖，也没有共享可变状态——每个任务
//! 持有自己的载荷，结果写进互不相交的槽位。挂起只发生在外部调用
//! 边界；在途调用数由进程级信号量约束，单任务超时按任务失败处理。
//!
//! 失败隔离：某个任务出错只影响它覆盖的段落（回退为原文并记录日志），
//! 绝不拖延或作废其他任务，管道整体不因单任务失败而失败。

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::llm::Transformer;
use crate::rewrite::classifier::TransformTask;
use crate::rewrite::codec::{decode_batch, encode_batch};
use crate::rewrite::error::{RewriteError, RewriteResult};
use crate::rewrite::stats::PipelineStats;

/// 单个段落的最终改写结果
///
/// 成功标志只用于统计与日志；重组阶段对两种情况的处理完全一致。
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub html: String,
    pub transformed: bool,
}

impl TransformOutcome {
    fn transformed(html: String) -> Self {
        Self {
            html,
            transformed: true,
        }
    }

    fn untouched(html: String) -> Self {
        Self {
            html,
            transformed: false,
        }
    }
}

/// 并发执行任务列表，返回按段落下标索引的结果数组
///
/// 每个段落下标恰好被写入一次；万一出现未写入的槽位（防御性，
/// 按分类器不变量不应发生），用 `originals` 里的原文补齐。
pub async fn dispatch_tasks(
    tasks: Vec<TransformTask>,
    originals: Vec<String>,
    transformer: Arc<dyn Transformer>,
    limiter: Arc<Semaphore>,
    task_timeout: Duration,
    stats: &PipelineStats,
) -> Vec<TransformOutcome> {
    let total_segments = originals.len();

    let futures = tasks.into_iter().map(|task| {
        let transformer = transformer.clone();
        let limiter = limiter.clone();
        run_task(task, transformer, limiter, task_timeout, stats)
    });

    // 全部任务并发推进，汇合后写入预分配的结果槽位
    let mut slots: Vec<Option<TransformOutcome>> = vec![None; total_segments];
    for task_results in join_all(futures).await {
        for (index, outcome) in task_results {
            if index < slots.len() {
                slots[index] = Some(outcome);
            }
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                tracing::warn!("段落 {} 没有任何任务写入结果，回退为原文", index);
                TransformOutcome::untouched(originals[index].clone())
            })
        })
        .collect()
}

/// 执行单个任务，返回它覆盖的所有段落的结果
async fn run_task(
    task: TransformTask,
    transformer: Arc<dyn Transformer>,
    limiter: Arc<Semaphore>,
    task_timeout: Duration,
    stats: &PipelineStats,
) -> Vec<(usize, TransformOutcome)> {
    match task {
        // 跳过的段落立即解析为原文，不占用外部调用配额
        TransformTask::Skip { index, html } => {
            vec![(index, TransformOutcome::untouched(html))]
        }

        TransformTask::Individual { index, html } => {
            match call_transformer(&transformer, &limiter, task_timeout, &html, stats).await {
                Ok(rewritten) => vec![(index, TransformOutcome::transformed(rewritten))],
                Err(e) => {
                    stats.inc_tasks_failed();
                    tracing::warn!("段落 {} 改写失败，保留原文: {}", index, e);
                    vec![(index, TransformOutcome::untouched(html))]
                }
            }
        }

        TransformTask::Batch { pieces } => {
            let htmls: Vec<String> = pieces.iter().map(|(_, html)| html.clone()).collect();
            let payload = encode_batch(&htmls);

            let decoded = match call_transformer(&transformer, &limiter, task_timeout, &payload, stats)
                .await
            {
                Ok(combined) => decode_batch(&combined, pieces.len()),
                Err(e) => Err(e),
            };

            match decoded {
                Ok(parts) => pieces
                    .into_iter()
                    .zip(parts)
                    .map(|((index, _), part)| (index, TransformOutcome::transformed(part)))
                    .collect(),
                Err(e) => {
                    stats.inc_tasks_failed();
                    if matches!(e, RewriteError::BatchDecodeMismatch { .. }) {
                        stats.inc_decode_mismatches();
                    }
                    tracing::warn!(
                        "批次任务失败，{} 个段落整批保留原文: {}",
                        pieces.len(),
                        e
                    );
                    pieces
                        .into_iter()
                        .map(|(index, html)| (index, TransformOutcome::untouched(html)))
                        .collect()
                }
            }
        }
    }
}

/// 一次受控的外部调用：信号量限流 + 超时 + 空响应校验
async fn call_transformer(
    transformer: &Arc<dyn Transformer>,
    limiter: &Arc<Semaphore>,
    task_timeout: Duration,
    payload: &str,
    stats: &PipelineStats,
) -> RewriteResult<String> {
    let _permit = limiter
        .acquire()
        .await
        .map_err(|e| RewriteError::Internal(format!("获取信号量失败: {}", e)))?;

    stats.add_characters_sent(payload.len());

    let rewritten = timeout(task_timeout, transformer.transform(payload))
        .await
        .map_err(|_| RewriteError::TransformTask("任务处理超时".to_string()))??;

    // 非空输入得到空输出视为可恢复失败（回退为原文）
    if !payload.trim().is_empty() && rewritten.trim().is_empty() {
        return Err(RewriteError::TransformTask(
            "改写服务返回空内容".to_string(),
        ));
    }

    stats.add_characters_received(rewritten.len());
    Ok(rewritten)
}
