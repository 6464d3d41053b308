//! 统一错误类型定义
//!
//! - `AppError`：启动阶段（配置解析、客户端构建、端口绑定）的错误，直接导致进程退出
//! - `ProxyError`：单次请求内的错误，最终被转换为返回给调用方的 HTTP 响应

use hyper::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// 启动/配置阶段错误
#[derive(Error, Debug)]
pub enum AppError {
    /// 白名单环境变量不是合法的 JSON 字符串数组
    #[error("环境变量 {var} 不是合法的 JSON 字符串数组: {source}")]
    InvalidAllowlist {
        var: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// 路径白名单中的正则无法编译
    #[error("路径白名单正则无效 `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// 普通标量环境变量取值非法
    #[error("环境变量 {var} 取值非法: {value}")]
    InvalidEnvValue { var: &'static str, value: String },

    /// 上游代理配置错误
    #[error("上游代理配置错误: {reason}")]
    ProxyConfigError { reason: String },

    /// HTTP 客户端构建失败
    #[error("HTTP 客户端构建失败: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// 其他错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// 请求错误分类，序列化到错误响应的 `kind` 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 调用方输入有误（缺少或无法解析目标 URL）
    MalformedInput,
    /// 被白名单或回环检测拒绝
    Authorization,
    /// 上游返回了错误状态码
    Upstream,
    /// 没有拿到上游响应（连接、DNS、TLS 或读流失败）
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedInput => "malformed_input",
            ErrorKind::Authorization => "authorization",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Transport => "transport",
        }
    }
}

/// 单次代理请求中的错误
///
/// `Display` 文本即返回给调用方的消息，不包含内部细节。
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Missing required query parameter: url")]
    MissingTarget,

    #[error("Invalid target url `{input}`: {source}")]
    InvalidTarget {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported target scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Forbidden endpoint: {0}")]
    ForbiddenEndpoint(String),

    #[error("Forbidden path: {0}")]
    ForbiddenPath(String),

    #[error("Forbidden Content Type: {0}")]
    ForbiddenContentType(String),

    #[error("Proxy loop detected: {0}")]
    ProxyLoop(String),

    #[error("Upstream responded with {status}: {message}")]
    UpstreamStatus { status: StatusCode, message: String },

    #[error("Upstream request failed: {0}")]
    Transport(String),
}

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::MissingTarget
            | ProxyError::InvalidTarget { .. }
            | ProxyError::UnsupportedScheme(_) => ErrorKind::MalformedInput,
            ProxyError::ForbiddenEndpoint(_)
            | ProxyError::ForbiddenPath(_)
            | ProxyError::ForbiddenContentType(_)
            | ProxyError::ProxyLoop(_) => ErrorKind::Authorization,
            ProxyError::UpstreamStatus { .. } => ErrorKind::Upstream,
            ProxyError::Transport(_) => ErrorKind::Transport,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTarget
            | ProxyError::InvalidTarget { .. }
            | ProxyError::UnsupportedScheme(_) => StatusCode::BAD_REQUEST,
            ProxyError::ForbiddenEndpoint(_)
            | ProxyError::ForbiddenPath(_)
            | ProxyError::ForbiddenContentType(_) => StatusCode::FORBIDDEN,
            ProxyError::ProxyLoop(_) => StatusCode::LOOP_DETECTED,
            ProxyError::UpstreamStatus { status, .. } => *status,
            ProxyError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// 错误码（JSON 响应的 `error` 字段）
    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::MissingTarget => "MISSING_TARGET",
            ProxyError::InvalidTarget { .. } => "INVALID_TARGET",
            ProxyError::UnsupportedScheme(_) => "UNSUPPORTED_SCHEME",
            ProxyError::ForbiddenEndpoint(_) => "FORBIDDEN_ENDPOINT",
            ProxyError::ForbiddenPath(_) => "FORBIDDEN_PATH",
            ProxyError::ForbiddenContentType(_) => "FORBIDDEN_CONTENT_TYPE",
            ProxyError::ProxyLoop(_) => "PROXY_LOOP_DETECTED",
            ProxyError::UpstreamStatus { .. } => "UPSTREAM_STATUS",
            ProxyError::Transport(_) => "UPSTREAM_UNAVAILABLE",
        }
    }

    /// 将 reqwest 错误归类：带状态码的归为上游错误，其余归为传输错误
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        // 去掉 URL，避免把查询串里的敏感参数回显给调用方
        let err = err.without_url();
        match err.status() {
            Some(status) => ProxyError::UpstreamStatus {
                status,
                message: status
                    .canonical_reason()
                    .unwrap_or("Upstream Error")
                    .to_string(),
            },
            None => ProxyError::Transport(describe_transport(&err)),
        }
    }
}

fn describe_transport(err: &reqwest::Error) -> String {
    let what = if err.is_connect() {
        "connection failed"
    } else if err.is_timeout() {
        "timed out"
    } else if err.is_redirect() {
        "too many redirects"
    } else if err.is_body() || err.is_decode() {
        "response body error"
    } else if err.is_builder() {
        "invalid request"
    } else {
        "request error"
    };
    format!("{what}: {err}")
}
