// 服务层

pub mod proxy;

pub use proxy::{ProxyContext, ProxyInstance};
