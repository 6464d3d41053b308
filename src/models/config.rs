// 日志配置，从 LOG_* 环境变量读取

use crate::core::error::{AppError, AppResult};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// 解析字符串为日志级别（大小写不敏感）
    pub fn parse(level_str: &str) -> Option<LogLevel> {
        match level_str.trim().to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 日志输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// 日志目录，未设置时使用 ~/.cors-proxy/logs
    pub file_path: Option<String>,
}

impl LogConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意查找函数构建配置（测试中可避免修改进程环境）
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LogConfig::default();

        if let Some(value) = non_empty(lookup("LOG_LEVEL")) {
            config.level = LogLevel::parse(&value).ok_or(AppError::InvalidEnvValue {
                var: "LOG_LEVEL",
                value,
            })?;
        }

        if let Some(value) = non_empty(lookup("LOG_FORMAT")) {
            config.format = match value.to_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(AppError::InvalidEnvValue {
                        var: "LOG_FORMAT",
                        value,
                    })
                }
            };
        }

        if let Some(value) = non_empty(lookup("LOG_OUTPUT")) {
            config.output = match value.to_lowercase().as_str() {
                "console" => LogOutput::Console,
                "file" => LogOutput::File,
                "both" => LogOutput::Both,
                _ => {
                    return Err(AppError::InvalidEnvValue {
                        var: "LOG_OUTPUT",
                        value,
                    })
                }
            };
        }

        config.file_path = non_empty(lookup("LOG_FILE_PATH"));

        Ok(config)
    }
}

/// 空字符串与未设置等价
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = LogConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, LogConfig::default());
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.output, LogOutput::Console);
    }

    #[test]
    fn test_reads_all_fields() {
        let config = LogConfig::from_lookup(lookup_from(&[
            ("LOG_LEVEL", "DEBUG"),
            ("LOG_FORMAT", "json"),
            ("LOG_OUTPUT", "both"),
            ("LOG_FILE_PATH", "/var/log/cors-proxy"),
        ]))
        .unwrap();

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::Both);
        assert_eq!(config.file_path.as_deref(), Some("/var/log/cors-proxy"));
    }

    #[test]
    fn test_rejects_unknown_level() {
        let err = LogConfig::from_lookup(lookup_from(&[("LOG_LEVEL", "loud")])).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidEnvValue {
                var: "LOG_LEVEL",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_value_is_unset() {
        let config = LogConfig::from_lookup(lookup_from(&[("LOG_OUTPUT", "  ")])).unwrap();
        assert_eq!(config.output, LogOutput::Console);
    }
}
