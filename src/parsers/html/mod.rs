//! HTML 解析与序列化工具

pub mod dom;
pub mod serializer;

pub use dom::{
    find_nodes, get_node_attr, get_node_name, html_to_dom, node_has_class, text_content,
    visible_text_length,
};
pub use serializer::{fragment_to_nodes, serialize_document, serialize_node, serialize_nodes};
