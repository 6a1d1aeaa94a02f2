//! 批次编解码器
//!
//! 多个段落折叠进一次外部调用时，用 HTML 注释形式的分隔标记拼接；
//! 响应按同样的标记还原为逐段字符串。标记放在注释里，既不会被渲染，
//! 也要求改写服务原样保留——服务丢失或复制标记时解码失败，整批
//! 回退为原文（§往返校验）。

use crate::rewrite::error::{RewriteError, RewriteResult};

/// 第 i 个分隔标记（序数从 0 起，不是段落的全局下标）
fn marker(ordinal: usize) -> String {
    format!("<!-- SECTION_BREAK_{} -->", ordinal)
}

/// 把多段 HTML 按下标顺序拼接为单个批次载荷
///
/// 标记插在第 i+1 段之前，共 n-1 个。
pub fn encode_batch(pieces: &[String]) -> String {
    let mut payload = String::new();

    for (position, piece) in pieces.iter().enumerate() {
        if position > 0 {
            payload.push_str(&marker(position - 1));
        }
        payload.push_str(piece);
    }

    payload
}

/// 把合并响应按分隔标记还原为 `expected` 段
///
/// 标记按序数升序逐个切分；任一标记缺失或多余导致段数对不上时
/// 返回 `BatchDecodeMismatch`，由调用方整批回退。
pub fn decode_batch(combined: &str, expected: usize) -> RewriteResult<Vec<String>> {
    if expected == 0 {
        return Ok(Vec::new());
    }

    let mut pieces = Vec::with_capacity(expected);
    let mut rest = combined;

    for ordinal in 0..expected - 1 {
        let marker = marker(ordinal);
        match rest.split_once(marker.as_str()) {
            Some((piece, tail)) => {
                pieces.push(piece.to_string());
                rest = tail;
            }
            None => {
                return Err(RewriteError::BatchDecodeMismatch {
                    expected,
                    found: pieces.len() + 1,
                });
            }
        }
    }

    // 最后一段不允许再残留任何分隔标记（服务复制标记的情况）
    if rest.contains("<!-- SECTION_BREAK_") {
        return Err(RewriteError::BatchDecodeMismatch {
            expected,
            found: expected + 1,
        });
    }

    pieces.push(rest.to_string());
    Ok(pieces)
}
