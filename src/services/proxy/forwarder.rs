//! 出站转发：用入站请求的方法请求目标 URL，响应体保持流式

use reqwest::Client;

use super::authorizer::Authorized;
use crate::core::error::ProxyError;

/// 发起出站请求
///
/// 只等待响应头；响应体由调用方按流读取。
/// 上游 4xx/5xx 视为失败，返回带上游状态码的 [`ProxyError::UpstreamStatus`]；
/// 拿不到任何响应时返回 [`ProxyError::Transport`]。
pub async fn forward(
    client: &Client,
    request: Authorized,
) -> Result<reqwest::Response, ProxyError> {
    let (method, target) = request.into_parts();

    tracing::debug!(method = %method, target = %target, "发起出站请求");

    let response = client
        .request(method, target)
        .send()
        .await
        .map_err(ProxyError::from_reqwest)?;

    response.error_for_status().map_err(ProxyError::from_reqwest)
}
