//! # 解析器模块
//!
//! HTML 文档的解析、遍历与序列化。

pub mod html;
