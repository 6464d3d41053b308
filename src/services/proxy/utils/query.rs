//! 从入站请求的查询串中提取目标 URL

use url::Url;

use crate::core::error::ProxyError;

/// 目标 URL 所在的查询参数名
pub const TARGET_PARAM: &str = "url";

/// 解析查询串中的 `url` 参数
///
/// - 参数出现多次时只取第一个
/// - 必须是绝对 URL，且协议为 http/https
pub fn target_url(query: Option<&str>) -> Result<Url, ProxyError> {
    let raw = query
        .and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == TARGET_PARAM)
                .map(|(_, value)| value.into_owned())
        })
        .filter(|value| !value.is_empty())
        .ok_or(ProxyError::MissingTarget)?;

    let target = Url::parse(&raw).map_err(|source| ProxyError::InvalidTarget {
        input: raw.clone(),
        source,
    })?;

    match target.scheme() {
        "http" | "https" => Ok(target),
        other => Err(ProxyError::UnsupportedScheme(other.to_string())),
    }
}
