//! 文档分段器
//!
//! 将 Wikipedia 正文区域拆成有序的可寻址段落：一个引言段加上每个
//! 顶级标题对应的章节段。段落持有指回原树的锚点与节点句柄，供
//! 重组阶段原位替换。

use std::rc::Rc;

use markup5ever_rcdom::{Handle, RcDom};

use crate::parsers::html::{
    find_nodes, get_node_attr, get_node_name, node_has_class, serialize_nodes, text_content,
    visible_text_length,
};
use crate::rewrite::error::{RewriteError, RewriteResult};

/// 段落类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// 引言（首个标题之前的内容）
    Intro,
    /// 标题分隔的章节
    Section,
}

/// 替换内容的插入锚点
///
/// 锚点是结构性的（绑定树位置），与任务完成顺序无关。
#[derive(Debug, Clone)]
pub enum Anchor {
    /// 插入到容器开头（整页没有标题时的引言）
    ContainerStart,
    /// 插入到该节点之前（引言，后随首个标题）
    Before(Handle),
    /// 插入到该节点之后（章节，锚定其标题包装节点）
    After(Handle),
}

/// 改写的基本单位
///
/// `owned_nodes` 是该段落要替换的原始节点，必须在新内容插入成功后
/// 才从文档中移除。不同段落的 `owned_nodes` 互不重叠。
pub struct Segment {
    /// 稳定排序键，0 保留给引言
    pub index: usize,
    pub kind: SegmentKind,
    /// 标题纯文本（小写；引言为空）
    pub heading_text: String,
    /// 段落全部节点序列化后的HTML，不含标题本身
    pub html: String,
    /// 可见文本字符数，分类阈值的依据
    pub text_length: usize,
    pub anchor: Anchor,
    pub owned_nodes: Vec<Handle>,
    /// 正文容器，锚点位置在它的子节点列表里解析
    pub container: Handle,
}

/// 判断容器级子节点是否为标题分隔节点
///
/// Wikipedia 把 h2 包在 `<div class="mw-heading mw-heading2">` 里。
pub fn is_heading_delimiter(node: &Handle) -> bool {
    get_node_name(node) == Some("div") && node_has_class(node, "mw-heading")
}

/// 提取标题包装节点的纯文本（小写）
fn heading_plain_text(heading: &Handle) -> String {
    for level in ["h1", "h2", "h3", "h4", "h5", "h6"] {
        if let Some(element) = find_nodes(heading, level).into_iter().next() {
            let mut text = String::new();
            text_content(&element, &mut text);
            return text.trim().to_lowercase();
        }
    }

    // 没有标题元素的包装节点，退回整个节点的文本
    let mut text = String::new();
    text_content(heading, &mut text);
    text.trim().to_lowercase()
}

/// 定位唯一的正文容器
///
/// 真正的正文在 `div#mw-content-text` 内嵌的 `div.mw-parser-output` 里，
/// 两层缺一即视为该请求不可改写。
fn find_content_container(dom: &RcDom) -> RewriteResult<Handle> {
    let content_text = find_nodes(&dom.document, "div")
        .into_iter()
        .find(|node| get_node_attr(node, "id").as_deref() == Some("mw-content-text"))
        .ok_or_else(|| RewriteError::ContentNotFound("mw-content-text".to_string()))?;

    find_nodes(&content_text, "div")
        .into_iter()
        .filter(|node| !Rc::ptr_eq(node, &content_text))
        .find(|node| node_has_class(node, "mw-parser-output"))
        .ok_or_else(|| RewriteError::ContentNotFound("mw-parser-output".to_string()))
}

/// 把文档正文拆成有序段落列表
///
/// 容器的直接子节点被精确划分一次：每个子节点要么属于唯一的段落，
/// 要么本身是标题分隔节点。标题是第一个子节点时引言仍然产生，
/// 只是内容为空（通常会被小段规则跳过）。
pub fn segment_document(dom: &RcDom) -> RewriteResult<Vec<Segment>> {
    let container = find_content_container(dom)?;
    let children: Vec<Handle> = container.children.borrow().iter().cloned().collect();

    let heading_positions: Vec<usize> = children
        .iter()
        .enumerate()
        .filter(|(_, child)| is_heading_delimiter(child))
        .map(|(position, _)| position)
        .collect();

    let mut segments = Vec::with_capacity(heading_positions.len() + 1);

    // 引言：首个标题之前的全部子节点
    let intro_end = heading_positions.first().copied().unwrap_or(children.len());
    let intro_nodes: Vec<Handle> = children[..intro_end].to_vec();
    let intro_anchor = match heading_positions.first() {
        Some(&position) => Anchor::Before(children[position].clone()),
        None => Anchor::ContainerStart,
    };

    segments.push(Segment {
        index: 0,
        kind: SegmentKind::Intro,
        heading_text: String::new(),
        html: serialize_nodes(&intro_nodes),
        text_length: visible_text_length(&intro_nodes),
        anchor: intro_anchor,
        owned_nodes: intro_nodes,
        container: container.clone(),
    });

    // 章节：每个标题到下一个标题（或容器末尾）之间的兄弟节点
    for (ordinal, &position) in heading_positions.iter().enumerate() {
        let end = heading_positions
            .get(ordinal + 1)
            .copied()
            .unwrap_or(children.len());
        let heading = children[position].clone();
        let owned_nodes: Vec<Handle> = children[position + 1..end].to_vec();

        segments.push(Segment {
            index: ordinal + 1,
            kind: SegmentKind::Section,
            heading_text: heading_plain_text(&heading),
            html: serialize_nodes(&owned_nodes),
            text_length: visible_text_length(&owned_nodes),
            anchor: Anchor::After(heading),
            owned_nodes,
            container: container.clone(),
        });
    }

    Ok(segments)
}
