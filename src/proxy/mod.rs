//! 代理转发策略
//!
//! 上游目标地址构造与响应头转发规则。

pub mod urls;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::config::{constants, ProxyConfig};

/// 按原样转发的上游响应头（缓存与校验相关）
pub const FORWARD_HEADERS: &[&str] = &[
    "Cache-Control",
    "ETag",
    "Last-Modified",
    "Content-Language",
    "Vary",
];

/// 始终设置的安全头：禁止协议升级，页面资源才能留在代理源内
pub const CONTENT_SECURITY_POLICY: &str = "upgrade-insecure-requests 'none'";

/// 构造上游目标URL
///
/// `wikimedia/` 前缀的路径走媒体上游（去掉命名空间前缀），其余路径
/// 拼到主上游；查询串原样转发。
pub fn build_target_url(path: &str, query: Option<&str>, config: &ProxyConfig) -> String {
    let media_prefix = format!("{}/", constants::MEDIA_NAMESPACE);

    let mut target = match path.strip_prefix(media_prefix.as_str()) {
        Some(media_path) => format!("{}/{}", config.media_base, media_path),
        None => format!("{}/{}", config.upstream_base, path),
    };

    if let Some(query) = query {
        if !query.is_empty() {
            target.push('?');
            target.push_str(query);
        }
    }

    target
}

/// 组装对客户端的响应头
///
/// 内容类型来自上游；转发固定允许清单里的头；CSP 头无条件设置。
pub fn response_headers(
    upstream_headers: &reqwest::header::HeaderMap,
    content_type: Option<&str>,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Some(content_type) = content_type {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            headers.insert(header::CONTENT_TYPE, value);
        }
    }

    for name in FORWARD_HEADERS {
        if let Some(value) = upstream_headers.get(*name) {
            let name = match HeaderName::from_bytes(name.as_bytes()) {
                Ok(name) => name,
                Err(_) => continue,
            };
            if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
                headers.insert(name, value);
            }
        }
    }

    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProxyConfig {
        ProxyConfig::default()
    }

    #[test]
    fn test_wiki_path_targets_primary_upstream() {
        let target = build_target_url("wiki/Test_Page", None, &config());
        assert_eq!(target, "https://en.wikipedia.org/wiki/Test_Page");
    }

    #[test]
    fn test_media_namespace_targets_media_upstream() {
        let target = build_target_url("wikimedia/wikipedia/commons/test.jpg", None, &config());
        assert_eq!(
            target,
            "https://upload.wikimedia.org/wikipedia/commons/test.jpg"
        );
    }

    #[test]
    fn test_query_string_is_forwarded() {
        let target = build_target_url(
            "w/index.php",
            Some("search=Python&title=Special:Search"),
            &config(),
        );
        assert_eq!(
            target,
            "https://en.wikipedia.org/w/index.php?search=Python&title=Special:Search"
        );
    }

    #[test]
    fn test_empty_query_is_dropped() {
        let target = build_target_url("wiki/Cat", Some(""), &config());
        assert_eq!(target, "https://en.wikipedia.org/wiki/Cat");
    }

    #[test]
    fn test_response_headers_forward_allow_list_and_set_csp() {
        let mut upstream = reqwest::header::HeaderMap::new();
        upstream.insert("Cache-Control", "max-age=3600".parse().unwrap());
        upstream.insert("ETag", "\"abc123\"".parse().unwrap());
        upstream.insert("X-Internal", "secret".parse().unwrap());

        let headers = response_headers(&upstream, Some("text/html; charset=utf-8"));

        assert_eq!(headers.get("Cache-Control").unwrap(), "max-age=3600");
        assert_eq!(headers.get("ETag").unwrap(), "\"abc123\"");
        assert!(headers.get("X-Internal").is_none());
        assert_eq!(
            headers.get("Content-Security-Policy").unwrap(),
            CONTENT_SECURITY_POLICY
        );
        assert_eq!(
            headers.get("Content-Type").unwrap(),
            "text/html; charset=utf-8"
        );
    }
}
