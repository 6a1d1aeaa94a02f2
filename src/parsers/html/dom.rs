use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: String) -> RcDom {
    let s: String;

    if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
        let (string, _, _) = encoding.decode(data);
        s = string.to_string();
    } else {
        s = String::from_utf8_lossy(data).to_string();
    }

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
        .unwrap()
}

/// 查找指定名称的DOM节点（含自身，按文档顺序）
pub fn find_nodes(node: &Handle, node_name: &str) -> Vec<Handle> {
    let mut found_nodes = Vec::new();

    if let NodeData::Element { ref name, .. } = node.data {
        if &*name.local == node_name {
            found_nodes.push(node.clone());
        }
    }

    for child_node in node.children.borrow().iter() {
        found_nodes.append(&mut find_nodes(child_node, node_name));
    }

    found_nodes
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 判断元素的 class 属性是否包含指定 token
pub fn node_has_class(node: &Handle, class_name: &str) -> bool {
    match get_node_attr(node, "class") {
        Some(value) => value.split_whitespace().any(|token| token == class_name),
        None => false,
    }
}

/// 收集节点（含子树）的全部文本内容
pub fn text_content(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => {
            out.push_str(&contents.borrow());
        }
        _ => {
            for child_node in node.children.borrow().iter() {
                text_content(child_node, out);
            }
        }
    }
}

/// 一组节点的可见文本字符数（前后空白不计）
///
/// 分类阈值基于它，不基于序列化后的HTML长度。
pub fn visible_text_length(nodes: &[Handle]) -> usize {
    let mut text = String::new();
    for node in nodes {
        text_content(node, &mut text);
    }
    text.trim().chars().count()
}
