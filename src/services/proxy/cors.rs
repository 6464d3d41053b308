//! CORS 包装层
//!
//! 在任何代理逻辑之前处理预检请求，并给每个响应加上宽松的跨域头。

use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use hyper::{Method, Request, Response, StatusCode};
use std::future::Future;

use super::utils::body::{empty, BoxBody};

pub const ALLOW_CREDENTIALS: &str = "true";
pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET,OPTIONS,POST";
pub const ALLOW_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

/// 写入四个 CORS 头（覆盖已有值）
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static(ALLOW_CREDENTIALS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// 预检响应：200 + 空 body
pub fn preflight() -> Response<BoxBody> {
    let mut response = Response::new(empty());
    *response.status_mut() = StatusCode::OK;
    apply_cors_headers(response.headers_mut());
    response
}

/// 用 CORS 处理包装任意请求处理函数
///
/// `OPTIONS` 请求直接返回预检响应，`handler` 不会被调用；
/// 其余请求调用 `handler`，并在其返回的任何响应上补齐 CORS 头。
pub async fn allow_cors<B, H, Fut>(req: Request<B>, handler: H) -> Response<BoxBody>
where
    H: FnOnce(Request<B>) -> Fut,
    Fut: Future<Output = Response<BoxBody>>,
{
    if req.method() == Method::OPTIONS {
        return preflight();
    }

    let mut response = handler(req).await;
    apply_cors_headers(response.headers_mut());
    response
}
