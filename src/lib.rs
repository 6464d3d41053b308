// lib.rs - 暴露代理服务给二进制和测试使用

pub mod core; // 核心基础设施层
pub mod models;
pub mod services;

pub use models::*;
pub use services::proxy::{ProxyContext, ProxyInstance};

// 重新导出常用类型
pub use crate::core::{init_logger, AppError, AppResult, ErrorKind, ProxyError};
