//! 代理配置数据模型
//!
//! 所有配置在进程启动时从环境变量读取一次，正则在此处预编译，
//! 之后以 `Arc<ProxyConfig>` 只读共享给每个请求。

use regex::Regex;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use super::config::non_empty;
use crate::core::error::{AppError, AppResult};

pub const CONTENT_TYPE_ALLOWLIST_VAR: &str = "CONTENT_TYPE_ALLOWLIST";
pub const PATH_ALLOWLIST_VAR: &str = "PATH_ALLOWLIST";
pub const ENDPOINT_ALLOWLIST_VAR: &str = "ENDPOINT_ALLOWLIST";

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 8787;

/// 三类白名单，空列表表示该维度不做限制
#[derive(Debug, Clone, Default)]
pub struct Allowlists {
    /// 目标主机（精确匹配）
    pub endpoints: Vec<String>,
    /// 目标路径正则（非锚定匹配）
    pub paths: Vec<Regex>,
    /// 响应 Content-Type 子串
    pub content_types: Vec<String>,
}

impl Allowlists {
    /// 从原始字符串构建，路径正则在此编译
    pub fn new(
        endpoints: Vec<String>,
        paths: Vec<String>,
        content_types: Vec<String>,
    ) -> AppResult<Self> {
        let paths = paths
            .into_iter()
            .map(|pattern| {
                Regex::new(&pattern).map_err(|source| AppError::InvalidPattern { pattern, source })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            endpoints,
            paths,
            content_types,
        })
    }
}

/// 代理服务配置
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub port: u16,
    /// 为 true 时监听 0.0.0.0，否则仅监听 127.0.0.1
    pub allow_public: bool,
    /// 出站请求使用的上游代理（http/https/socks5）
    pub upstream_proxy: Option<String>,
    pub allowlists: Allowlists,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allow_public: false,
            upstream_proxy: None,
            allowlists: Allowlists::default(),
        }
    }
}

impl ProxyConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match non_empty(lookup("PORT")) {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| AppError::InvalidEnvValue { var: "PORT", value })?,
            None => DEFAULT_PORT,
        };

        let allow_public = match non_empty(lookup("ALLOW_PUBLIC")) {
            Some(value) => parse_bool(&value).ok_or(AppError::InvalidEnvValue {
                var: "ALLOW_PUBLIC",
                value,
            })?,
            None => false,
        };

        let allowlists = Allowlists::new(
            parse_allowlist(ENDPOINT_ALLOWLIST_VAR, lookup(ENDPOINT_ALLOWLIST_VAR))?,
            parse_allowlist(PATH_ALLOWLIST_VAR, lookup(PATH_ALLOWLIST_VAR))?,
            parse_allowlist(
                CONTENT_TYPE_ALLOWLIST_VAR,
                lookup(CONTENT_TYPE_ALLOWLIST_VAR),
            )?,
        )?;

        Ok(Self {
            port,
            allow_public,
            upstream_proxy: non_empty(lookup("UPSTREAM_PROXY")),
            allowlists,
        })
    }

    /// 监听地址
    pub fn bind_addr(&self) -> SocketAddr {
        let ip = if self.allow_public {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };
        SocketAddr::new(ip, self.port)
    }
}

/// 解析 JSON 字符串数组；未设置或空字符串视为空列表
fn parse_allowlist(var: &'static str, raw: Option<String>) -> AppResult<Vec<String>> {
    match non_empty(raw) {
        Some(json) => serde_json::from_str::<Vec<String>>(&json)
            .map_err(|source| AppError::InvalidAllowlist { var, source }),
        None => Ok(Vec::new()),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_unset_means_no_restriction() {
        let config = ProxyConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.allow_public);
        assert!(config.upstream_proxy.is_none());
        assert!(config.allowlists.endpoints.is_empty());
        assert!(config.allowlists.paths.is_empty());
        assert!(config.allowlists.content_types.is_empty());
    }

    #[test]
    fn test_parses_all_allowlists() {
        let config = ProxyConfig::from_lookup(lookup_from(&[
            (ENDPOINT_ALLOWLIST_VAR, r#"["example.com", "api.example.com"]"#),
            (PATH_ALLOWLIST_VAR, r#"["^/api/", "\\.json$"]"#),
            (CONTENT_TYPE_ALLOWLIST_VAR, r#"["application/json"]"#),
            ("PORT", "3000"),
            ("ALLOW_PUBLIC", "true"),
        ]))
        .unwrap();

        assert_eq!(
            config.allowlists.endpoints,
            vec!["example.com".to_string(), "api.example.com".to_string()]
        );
        assert_eq!(config.allowlists.paths.len(), 2);
        assert!(config.allowlists.paths[1].is_match("/data.json"));
        assert_eq!(config.allowlists.content_types, vec!["application/json"]);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000".parse().unwrap());
    }

    #[test]
    fn test_empty_string_is_unset() {
        let config =
            ProxyConfig::from_lookup(lookup_from(&[(PATH_ALLOWLIST_VAR, "")])).unwrap();
        assert!(config.allowlists.paths.is_empty());
    }

    #[test]
    fn test_malformed_json_fails_fast() {
        let err = ProxyConfig::from_lookup(lookup_from(&[(ENDPOINT_ALLOWLIST_VAR, "example.com")]))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidAllowlist {
                var: ENDPOINT_ALLOWLIST_VAR,
                ..
            }
        ));

        // 非字符串元素同样拒绝
        let err = ProxyConfig::from_lookup(lookup_from(&[(CONTENT_TYPE_ALLOWLIST_VAR, "[1, 2]")]))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAllowlist { .. }));
    }

    #[test]
    fn test_invalid_regex_fails_fast() {
        let err = ProxyConfig::from_lookup(lookup_from(&[(PATH_ALLOWLIST_VAR, r#"["(unclosed"]"#)]))
            .unwrap_err();
        match err {
            AppError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_port_and_bool() {
        let err = ProxyConfig::from_lookup(lookup_from(&[("PORT", "70000")])).unwrap_err();
        assert!(matches!(err, AppError::InvalidEnvValue { var: "PORT", .. }));

        let err = ProxyConfig::from_lookup(lookup_from(&[("ALLOW_PUBLIC", "maybe")])).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidEnvValue {
                var: "ALLOW_PUBLIC",
                ..
            }
        ));
    }

    #[test]
    fn test_default_binds_loopback() {
        let config = ProxyConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8787".parse().unwrap());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var(ENDPOINT_ALLOWLIST_VAR, r#"["example.com"]"#);
        std::env::set_var(PATH_ALLOWLIST_VAR, r#"["^/api/"]"#);
        let result = ProxyConfig::from_env();
        std::env::remove_var(ENDPOINT_ALLOWLIST_VAR);
        std::env::remove_var(PATH_ALLOWLIST_VAR);

        let config = result.unwrap();
        assert_eq!(config.allowlists.endpoints, vec!["example.com"]);
        assert!(config.allowlists.paths[0].is_match("/api/v1"));
    }
}
