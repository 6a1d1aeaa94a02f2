use encoding_rs::Encoding;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{namespace_url, ns, parse_fragment, LocalName, QualName};
use markup5ever_rcdom::{Handle, RcDom, SerializableHandle};

/// 序列化整个文档
pub fn serialize_document(dom: RcDom, document_encoding: String) -> Vec<u8> {
    let mut buf: Vec<u8> = Vec::new();

    let serializable: SerializableHandle = dom.document.into();
    serialize(&mut buf, &serializable, SerializeOpts::default())
        .expect("Unable to serialize DOM into buffer");

    if !document_encoding.is_empty() {
        if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
            let s: &str = &String::from_utf8_lossy(&buf);
            let (data, _, _) = encoding.encode(s);
            buf = data.to_vec();
        }
    }

    buf
}

/// 序列化单个节点（含节点自身，不止子节点）
pub fn serialize_node(node: &Handle) -> String {
    let mut buf: Vec<u8> = Vec::new();

    let serializable: SerializableHandle = node.clone().into();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    serialize(&mut buf, &serializable, opts).expect("Unable to serialize node into buffer");

    String::from_utf8_lossy(&buf).to_string()
}

/// 按文档顺序序列化一组节点并拼接
pub fn serialize_nodes(nodes: &[Handle]) -> String {
    nodes.iter().map(serialize_node).collect()
}

/// 将 HTML 片段解析为节点列表
///
/// 以 body 为上下文解析，返回片段的顶层节点（已脱离解析用的临时树，
/// 插入目标文档前由调用方重新设置父节点）。
pub fn fragment_to_nodes(html: &str) -> Vec<Handle> {
    let dom = parse_fragment(
        RcDom::default(),
        Default::default(),
        QualName::new(None, ns!(html), LocalName::from("body")),
        vec![],
    )
    .one(html);

    let document_children = dom.document.children.borrow();
    let root = match document_children.first() {
        Some(root) => root,
        None => return Vec::new(),
    };

    let nodes: Vec<Handle> = root.children.borrow_mut().drain(..).collect();
    for node in &nodes {
        node.parent.set(None);
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{find_nodes, html_to_dom};

    #[test]
    fn test_serialize_node_includes_element_itself() {
        let dom = html_to_dom(b"<p>hello <b>world</b></p>", "utf-8".to_string());
        let p = find_nodes(&dom.document, "p").remove(0);
        assert_eq!(serialize_node(&p), "<p>hello <b>world</b></p>");
    }

    #[test]
    fn test_fragment_roundtrip() {
        let html = "<p>one</p><ul><li>two</li></ul>";
        let nodes = fragment_to_nodes(html);
        assert_eq!(nodes.len(), 2);
        assert_eq!(serialize_nodes(&nodes), html);
    }

    #[test]
    fn test_fragment_preserves_text_and_comment_nodes() {
        let nodes = fragment_to_nodes("text<!-- note --><p>x</p>");
        assert_eq!(nodes.len(), 3);
        assert_eq!(serialize_nodes(&nodes), "text<!-- note --><p>x</p>");
    }

    #[test]
    fn test_fragment_empty_input() {
        assert!(fragment_to_nodes("").is_empty());
    }

    #[test]
    fn test_serialize_document_roundtrip_keeps_content() {
        let dom = html_to_dom(
            b"<html><head></head><body><p>abc</p></body></html>",
            "utf-8".to_string(),
        );
        let out = serialize_document(dom, "utf-8".to_string());
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("<p>abc</p>"));
    }
}
