//! 响应过滤与转发
//!
//! 先检查上游 Content-Type，再把响应体逐块转发给调用方。
//! 被拒绝时一个字节的上游响应体都不会写出。

use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};

use super::utils::body::{self, BoxBody};
use crate::core::error::ProxyError;

/// Content-Type 子串匹配
///
/// 白名单为空时不限制；上游未声明 Content-Type 时同样放行。
pub fn check_content_type(
    allowlist: &[String],
    content_type: Option<&str>,
) -> Result<(), ProxyError> {
    match content_type {
        Some(content_type)
            if !allowlist.is_empty()
                && !allowlist
                    .iter()
                    .any(|allowed| content_type.contains(allowed.as_str())) =>
        {
            Err(ProxyError::ForbiddenContentType(content_type.to_string()))
        }
        _ => Ok(()),
    }
}

/// 过滤并转发上游响应
///
/// 只复制状态码和响应体，上游的其他响应头不透传。
pub fn relay(
    upstream: reqwest::Response,
    content_type_allowlist: &[String],
) -> Result<Response<BoxBody>, ProxyError> {
    // 非 UTF-8 的头部按有损解码比较，不能当作“未声明”放行
    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    check_content_type(content_type_allowlist, content_type.as_deref())?;

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response = Response::new(body::stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    Ok(response)
}
