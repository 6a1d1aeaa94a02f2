//! Web 请求处理器

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::config::constants;
use crate::proxy::{build_target_url, response_headers};
use crate::rewrite::process_content;
use crate::web::types::AppState;

/// 根路径重定向到默认文档
pub async fn root() -> Redirect {
    Redirect::temporary(constants::DEFAULT_DOCUMENT_PATH)
}

/// 兜底 404 页面，带返回默认文档的链接
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Html("Page not found. Try <a href='/wiki/Main_Page'>Wikipedia Main Page</a>"),
    )
}

/// 主代理处理器
///
/// 把请求转发到上游（媒体命名空间走媒体上游），对响应执行URL重写
/// 与（满足条件时）章节改写，再按转发策略拼装响应头返回。
pub async fn proxy(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    request_headers: HeaderMap,
) -> Response {
    let target_url = build_target_url(&path, query.as_deref(), &state.config);

    let client_user_agent = request_headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());

    // 上游传输失败：请求级致命，502 + 说明
    let fetched = match state.upstream.fetch(&target_url, client_user_agent).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::error!("上游请求失败 {}: {}", target_url, e);
            return (StatusCode::BAD_GATEWAY, e.to_string()).into_response();
        }
    };

    let content_type = fetched.content_type.clone();

    // 结构性错误（正文容器缺失等）同样请求级致命；任务级失败
    // 已在管道内部回退为原文，不会走到这里
    let body = match process_content(
        &state.pipeline,
        fetched.body,
        content_type.as_deref(),
        &path,
        &state.config.public_origin,
    )
    .await
    {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("页面处理失败 /{}: {}", path, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing page: {}", e),
            )
                .into_response();
        }
    };

    let status = StatusCode::from_u16(fetched.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let headers = response_headers(&fetched.headers, content_type.as_deref());

    (status, headers, Body::from(body)).into_response()
}
