pub mod config;
pub mod proxy_config;

pub use config::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use proxy_config::{Allowlists, ProxyConfig};
