//! URL 重写
//!
//! 对原始HTML字节做纯字符串替换，把上游域名的资源地址改写到代理
//! 自身的源，与章节改写完全独立，在分段之前无条件执行。

use std::sync::OnceLock;

use regex::Regex;

/// 绝对上游地址（可带子域名）
fn wikipedia_absolute_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"https?://([a-z]+\.)?wikipedia\.org").expect("invalid wikipedia URL pattern")
    })
}

/// 协议相对上游地址
fn wikipedia_protocol_relative_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"//([a-z]+\.)?wikipedia\.org")
            .expect("invalid protocol-relative URL pattern")
    })
}

/// 媒体上游地址
fn wikimedia_upload_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"https?://upload\.wikimedia\.org").expect("invalid wikimedia URL pattern")
    })
}

/// 把HTML内容里的上游URL改写为经由代理的地址
///
/// 三条固定替换：绝对域名地址、协议相对地址、媒体地址（加 wikimedia
/// 命名空间前缀）。非HTML内容原样返回；字节不是合法UTF-8时同样
/// 原样返回而不报错（编码错误软化处理）。
pub fn rewrite_urls(content: Vec<u8>, content_type: Option<&str>, public_origin: &str) -> Vec<u8> {
    let is_html = content_type
        .map(|value| value.contains("text/html"))
        .unwrap_or(false);
    if !is_html {
        return content;
    }

    let html = match String::from_utf8(content) {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!("内容不是合法UTF-8，跳过URL重写");
            return e.into_bytes();
        }
    };

    let html = wikipedia_absolute_re().replace_all(&html, format!("http://{}", public_origin));
    let html =
        wikipedia_protocol_relative_re().replace_all(&html, format!("//{}", public_origin));
    let html =
        wikimedia_upload_re().replace_all(&html, format!("http://{}/wikimedia", public_origin));

    html.into_owned().into_bytes()
}
