//! 代理错误响应模板
//!
//! 拒绝类错误（输入错误、白名单拒绝）返回纯文本；
//! 上游错误和传输错误返回统一的 JSON 结构。

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::Response;
use serde::Serialize;

use super::body::{full, BoxBody};
use crate::core::error::{ErrorKind, ProxyError};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// JSON 错误体
#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub error: &'static str,
    pub kind: ErrorKind,
    pub status: u16,
    pub message: String,
}

impl From<&ProxyError> for ErrorPayload {
    fn from(err: &ProxyError) -> Self {
        Self {
            error: err.code(),
            kind: err.kind(),
            status: err.status().as_u16(),
            message: err.to_string(),
        }
    }
}

/// 将请求错误转换为返回给调用方的响应
pub fn from_error(err: &ProxyError) -> Response<BoxBody> {
    match err.kind() {
        ErrorKind::MalformedInput | ErrorKind::Authorization => plain_text(err),
        ErrorKind::Upstream | ErrorKind::Transport => json(err),
    }
}

fn plain_text(err: &ProxyError) -> Response<BoxBody> {
    let mut response = Response::new(full(err.to_string()));
    *response.status_mut() = err.status();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    response
}

fn json(err: &ProxyError) -> Response<BoxBody> {
    let payload = ErrorPayload::from(err);
    let body = serde_json::to_vec(&payload).unwrap_or_else(|_| payload.message.into_bytes());

    let mut response = Response::new(full(body));
    *response.status_mut() = err.status();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    response
}
