//! 代理回环检测工具
//!
//! 防止目标 URL 指回代理自身导致无限递归转发

use std::net::{IpAddr, SocketAddr};
use url::{Host, Url};

/// 检查目标 URL 是否指向代理自身的监听地址
///
/// # 参数
/// - `target`: 目标 URL
/// - `own_addr`: 当前代理实际监听的地址
///
/// # 返回
/// - `true`: 检测到回环
/// - `false`: 未检测到回环
pub fn is_proxy_loop(target: &Url, own_addr: SocketAddr) -> bool {
    if target.port_or_known_default() != Some(own_addr.port()) {
        return false;
    }

    match target.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => is_own_ip(IpAddr::V4(ip), own_addr.ip()),
        Some(Host::Ipv6(ip)) => is_own_ip(IpAddr::V6(ip), own_addr.ip()),
        None => false,
    }
}

fn is_own_ip(target_ip: IpAddr, own_ip: IpAddr) -> bool {
    target_ip.is_loopback() || target_ip.is_unspecified() || target_ip == own_ip
}
