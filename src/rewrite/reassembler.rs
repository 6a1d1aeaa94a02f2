//! 文档重组器
//!
//! 把每个段落的最终HTML（改写成功为新文本，否则为原文）拼回原树：
//! 先在段落锚点处插入新节点，再移除被替换的原节点。插入先于移除，
//! 锚点引用的节点才不会被提前删除而失效。锚点是结构性的，段落
//! 之间的处理顺序无关紧要。

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::parsers::html::fragment_to_nodes;
use crate::rewrite::dispatcher::TransformOutcome;
use crate::rewrite::error::{RewriteError, RewriteResult};
use crate::rewrite::segmenter::{Anchor, Segment};

/// 在子节点列表中定位句柄位置（按指针相等）
fn position_of(children: &[Handle], target: &Handle) -> RewriteResult<usize> {
    children
        .iter()
        .position(|child| Rc::ptr_eq(child, target))
        .ok_or_else(|| RewriteError::Internal("锚点节点已不在容器中".to_string()))
}

/// 把全部段落结果拼接回文档
///
/// `results` 按段落下标索引，必须覆盖每个段落恰好一次。
pub fn reassemble_document(
    segments: &[Segment],
    results: &[TransformOutcome],
) -> RewriteResult<()> {
    if results.len() != segments.len() {
        return Err(RewriteError::Internal(format!(
            "段落数与结果数不匹配: {} vs {}",
            segments.len(),
            results.len()
        )));
    }

    for segment in segments {
        splice_segment(segment, &results[segment.index].html)?;
    }

    Ok(())
}

/// 替换单个段落：解析片段 -> 锚点处插入 -> 移除原节点
fn splice_segment(segment: &Segment, final_html: &str) -> RewriteResult<()> {
    let new_nodes = fragment_to_nodes(final_html);

    let mut children = segment.container.children.borrow_mut();

    // 锚点位置在插入时解析，不受其他段落先行替换的影响
    let insert_at = match &segment.anchor {
        Anchor::ContainerStart => 0,
        Anchor::Before(node) => position_of(&children, node)?,
        Anchor::After(node) => position_of(&children, node)? + 1,
    };

    for (offset, node) in new_nodes.iter().enumerate() {
        node.parent.set(Some(Rc::downgrade(&segment.container)));
        children.insert(insert_at + offset, node.clone());
    }

    // 插入完成后才移除旧节点（按身份匹配，位置偏移无影响）
    children.retain(|child| {
        let owned = segment
            .owned_nodes
            .iter()
            .any(|node| Rc::ptr_eq(node, child));
        if owned {
            child.parent.set(None);
        }
        !owned
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{html_to_dom, serialize_document};
    use crate::rewrite::segmenter::segment_document;

    fn wiki_dom(body: &str) -> markup5ever_rcdom::RcDom {
        let html = format!(
            "<html><body><div id=\"mw-content-text\">\
             <div class=\"mw-parser-output\">{}</div></div></body></html>",
            body
        );
        html_to_dom(html.as_bytes(), "utf-8".to_string())
    }

    fn outcome(html: &str, transformed: bool) -> TransformOutcome {
        TransformOutcome {
            html: html.to_string(),
            transformed,
        }
    }

    fn serialize(dom: markup5ever_rcdom::RcDom) -> String {
        String::from_utf8(serialize_document(dom, "utf-8".to_string())).unwrap()
    }

    #[test]
    fn test_replaces_intro_and_sections_in_place() {
        let dom = wiki_dom(
            "<p>old intro</p>\
             <div class=\"mw-heading mw-heading2\"><h2>One</h2></div><p>old one</p>\
             <div class=\"mw-heading mw-heading2\"><h2>Two</h2></div><p>old two</p>",
        );
        let segments = segment_document(&dom).unwrap();
        let results = vec![
            outcome("<p>new intro</p>", true),
            outcome("<p>new one</p><p>extra</p>", true),
            outcome("<p>new two</p>", true),
        ];

        reassemble_document(&segments, &results).unwrap();
        let out = serialize(dom);

        assert!(out.contains("<p>new intro</p>"));
        assert!(out.contains("<p>new one</p><p>extra</p>"));
        assert!(out.contains("<p>new two</p>"));
        assert!(!out.contains("old intro"));
        assert!(!out.contains("old one"));
        assert!(!out.contains("old two"));

        // 标题与文档顺序原样保留
        let intro_at = out.find("new intro").unwrap();
        let h_one = out.find("<h2>One</h2>").unwrap();
        let one_at = out.find("new one").unwrap();
        let h_two = out.find("<h2>Two</h2>").unwrap();
        let two_at = out.find("new two").unwrap();
        assert!(intro_at < h_one && h_one < one_at && one_at < h_two && h_two < two_at);
    }

    #[test]
    fn test_untouched_results_keep_document_equivalent() {
        let body = "<p>intro</p>\
                    <div class=\"mw-heading mw-heading2\"><h2>One</h2></div><p>body</p>";
        let dom = wiki_dom(body);
        let segments = segment_document(&dom).unwrap();
        let results: Vec<TransformOutcome> = segments
            .iter()
            .map(|segment| outcome(&segment.html, false))
            .collect();

        reassemble_document(&segments, &results).unwrap();
        let out = serialize(dom);

        assert!(out.contains("<p>intro</p>"));
        assert!(out.contains("<p>body</p>"));
        assert!(out.contains("<h2>One</h2>"));
    }

    #[test]
    fn test_intro_without_heading_inserts_at_container_start() {
        let dom = wiki_dom("<p>only intro</p>");
        let segments = segment_document(&dom).unwrap();
        let results = vec![outcome("<p>rewritten</p>", true)];

        reassemble_document(&segments, &results).unwrap();
        let out = serialize(dom);

        assert!(out.contains("<p>rewritten</p>"));
        assert!(!out.contains("only intro"));
    }

    #[test]
    fn test_empty_intro_insertion_before_first_heading() {
        let dom = wiki_dom(
            "<div class=\"mw-heading mw-heading2\"><h2>First</h2></div><p>section body</p>",
        );
        let segments = segment_document(&dom).unwrap();
        let results = vec![
            outcome("", false),
            outcome("<p>new section body</p>", true),
        ];

        reassemble_document(&segments, &results).unwrap();
        let out = serialize(dom);

        assert!(out.contains("<h2>First</h2>"));
        assert!(out.contains("<p>new section body</p>"));
        assert!(!out.contains("<p>section body</p>"));
    }

    #[test]
    fn test_result_count_mismatch_is_internal_error() {
        let dom = wiki_dom("<p>intro</p>");
        let segments = segment_document(&dom).unwrap();

        let err = reassemble_document(&segments, &[]).unwrap_err();
        assert!(matches!(err, RewriteError::Internal(_)));
    }

    #[test]
    fn test_section_processing_order_does_not_matter() {
        // 锚点绑定树位置：后段先替换，再替换前段，结果一致
        let dom = wiki_dom(
            "<p>intro</p>\
             <div class=\"mw-heading mw-heading2\"><h2>One</h2></div><p>a</p>\
             <div class=\"mw-heading mw-heading2\"><h2>Two</h2></div><p>b</p>",
        );
        let segments = segment_document(&dom).unwrap();
        let results = vec![
            outcome("<p>I</p>", true),
            outcome("<p>A</p>", true),
            outcome("<p>B</p>", true),
        ];

        // 逆序替换
        for segment in segments.iter().rev() {
            splice_segment(segment, &results[segment.index].html).unwrap();
        }
        let out = serialize(dom);

        let i_at = out.find("<p>I</p>").unwrap();
        let a_at = out.find("<p>A</p>").unwrap();
        let b_at = out.find("<p>B</p>").unwrap();
        assert!(i_at < a_at && a_at < b_at);
    }
}
