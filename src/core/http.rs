use crate::core::error::{AppError, AppResult};
use reqwest::Client;

const USER_AGENT: &str = concat!("cors-proxy/", env!("CARGO_PKG_VERSION"));

/// 最大重定向次数
const MAX_REDIRECTS: usize = 10;

/// 构建出站 HTTP 客户端
///
/// # 参数
/// - `upstream_proxy`: 可选的上游代理 URL（http/https/socks5）
///
/// 未配置上游代理时显式禁用系统代理环境变量，出站路径只由本服务配置决定。
/// 不设置整体超时，响应体是流式转发的。
pub fn build_http_client(upstream_proxy: Option<&str>) -> AppResult<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

    builder = match upstream_proxy {
        Some(proxy_url) => {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                if proxy_url.starts_with("socks5") {
                    AppError::ProxyConfigError {
                        reason: format!(
                            "SOCKS5 代理初始化失败：{e}；若需要远程 DNS 解析，请使用 socks5h://"
                        ),
                    }
                } else {
                    AppError::ProxyConfigError {
                        reason: format!("代理 URL 无效: {e}"),
                    }
                }
            })?;
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_upstream_proxy() {
        assert!(build_http_client(None).is_ok());
    }

    #[test]
    fn test_build_with_http_upstream_proxy() {
        assert!(build_http_client(Some("http://127.0.0.1:8080")).is_ok());
    }

    #[test]
    fn test_invalid_upstream_proxy_is_config_error() {
        let err = build_http_client(Some("http://[::1")).unwrap_err();
        assert!(matches!(err, AppError::ProxyConfigError { .. }));
    }
}
