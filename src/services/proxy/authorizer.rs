//! 请求授权：按主机白名单和路径白名单判断是否允许转发
//!
//! 判定规则：
//! - 主机白名单非空：主机命中 **或** 路径命中任一规则即放行，否则 `Forbidden endpoint`
//! - 主机白名单为空、路径白名单非空：路径必须命中，否则 `Forbidden path`
//! - 两者皆空：放行

use hyper::Method;
use regex::Regex;
use url::Url;

use crate::core::error::ProxyError;
use crate::models::proxy_config::Allowlists;

/// 已通过授权的出站请求
///
/// 只能由 [`authorize`] 构造，转发器只接受该类型。
#[derive(Debug, Clone)]
pub struct Authorized {
    method: Method,
    target: Url,
}

impl Authorized {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn into_parts(self) -> (Method, Url) {
        (self.method, self.target)
    }
}

pub fn authorize(
    allowlists: &Allowlists,
    method: Method,
    target: Url,
) -> Result<Authorized, ProxyError> {
    let path = target.path();

    if !allowlists.endpoints.is_empty() {
        if !is_endpoint_allowed(&allowlists.endpoints, &target)
            && !is_path_allowed(&allowlists.paths, path)
        {
            return Err(ProxyError::ForbiddenEndpoint(
                target.host_str().unwrap_or_default().to_string(),
            ));
        }
    } else if !allowlists.paths.is_empty() && !is_path_allowed(&allowlists.paths, path) {
        return Err(ProxyError::ForbiddenPath(path.to_string()));
    }

    Ok(Authorized { method, target })
}

/// 主机精确匹配；目标带显式端口时也接受 `host:port` 形式的条目
pub fn is_endpoint_allowed(endpoints: &[String], target: &Url) -> bool {
    let Some(host) = target.host_str() else {
        return false;
    };
    let host_with_port = target.port().map(|port| format!("{host}:{port}"));

    endpoints
        .iter()
        .any(|entry| entry == host || host_with_port.as_deref() == Some(entry.as_str()))
}

/// 任一正则在路径中找到匹配即放行
pub fn is_path_allowed(paths: &[Regex], path: &str) -> bool {
    paths.iter().any(|re| re.is_match(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowlists(endpoints: &[&str], paths: &[&str]) -> Allowlists {
        Allowlists::new(
            endpoints.iter().map(|s| s.to_string()).collect(),
            paths.iter().map(|s| s.to_string()).collect(),
            Vec::new(),
        )
        .unwrap()
    }

    fn check(lists: &Allowlists, target: &str) -> Result<Authorized, ProxyError> {
        authorize(lists, Method::GET, Url::parse(target).unwrap())
    }

    #[test]
    fn test_no_allowlists_pass_everything() {
        let lists = allowlists(&[], &[]);
        assert!(check(&lists, "https://anything.test/any/path").is_ok());
        assert!(check(&lists, "http://10.0.0.1:9000/").is_ok());
    }

    #[test]
    fn test_endpoint_allowlist_accepts_listed_host() {
        let lists = allowlists(&["example.com"], &["^/api/"]);
        let authorized = check(&lists, "https://example.com/data.json").unwrap();
        assert_eq!(authorized.target().path(), "/data.json");
        assert_eq!(authorized.method(), Method::GET);
    }

    #[test]
    fn test_endpoint_allowlist_rejects_unlisted_host() {
        let lists = allowlists(&["example.com"], &[]);
        match check(&lists, "https://evil.test/x") {
            Err(ProxyError::ForbiddenEndpoint(host)) => assert_eq!(host, "evil.test"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_path_match_overrides_endpoint_rejection() {
        let lists = allowlists(&["example.com"], &["^/public/"]);
        assert!(check(&lists, "https://other.test/public/file").is_ok());
        assert!(check(&lists, "https://other.test/private/file").is_err());
    }

    #[test]
    fn test_path_allowlist_alone() {
        let lists = allowlists(&[], &["^/api/"]);
        assert!(check(&lists, "https://example.com/api/v1").is_ok());
        match check(&lists, "https://example.com/other") {
            Err(ProxyError::ForbiddenPath(path)) => assert_eq!(path, "/other"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_path_patterns_are_unanchored() {
        let lists = allowlists(&[], &["api"]);
        assert!(check(&lists, "https://example.com/v2/api/items").is_ok());
    }

    #[test]
    fn test_path_is_not_query() {
        let lists = allowlists(&[], &["secret"]);
        assert!(check(&lists, "https://example.com/open?secret=1").is_err());
    }

    #[test]
    fn test_endpoint_ignores_scheme_and_port() {
        let lists = allowlists(&["example.com"], &[]);
        assert!(check(&lists, "http://example.com:8080/").is_ok());
        assert!(check(&lists, "https://sub.example.com/").is_err());
    }

    #[test]
    fn test_endpoint_entry_with_port() {
        let lists = allowlists(&["localhost:3000"], &[]);
        assert!(check(&lists, "http://localhost:3000/").is_ok());
        assert!(check(&lists, "http://localhost:4000/").is_err());
    }
}
