// 转发代理服务模块
//
// 请求流水线：cors → utils::query → authorizer → forwarder → relay

pub mod authorizer;
pub mod cors;
pub mod forwarder;
pub mod proxy_instance;
pub mod relay;
pub mod utils;


pub use proxy_instance::{ProxyContext, ProxyInstance};
