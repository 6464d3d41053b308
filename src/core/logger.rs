use crate::models::config::{LogConfig, LogFormat, LogLevel, LogOutput};
use std::path::PathBuf;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// 日志文件名前缀（按天滚动）
const LOG_FILE_PREFIX: &str = "cors-proxy";

/// 初始化日志系统
///
/// 支持：
/// - 日志级别（trace/debug/info/warn/error），`RUST_LOG` 优先
/// - 输出格式（JSON/纯文本）
/// - 输出目标（控制台/文件/both）
///
/// 只能调用一次，重复初始化返回错误。
pub fn init_logger(config: &LogConfig) -> anyhow::Result<()> {
    let filter = create_env_filter(&config.level);

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if matches!(config.output, LogOutput::Console | LogOutput::Both) {
        layers.push(match config.format {
            LogFormat::Text => create_console_text_layer(),
            LogFormat::Json => create_console_json_layer(),
        });
    }

    if matches!(config.output, LogOutput::File | LogOutput::Both) {
        let log_dir = get_log_dir(config.file_path.as_deref())?;
        layers.push(create_file_layer(log_dir, config.format));
    }

    Registry::default()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("日志系统已初始化，不能重复初始化: {e}"))?;

    tracing::info!(
        level = config.level.as_str(),
        format = ?config.format,
        output = ?config.output,
        file_path = ?config.file_path,
        "日志系统初始化完成"
    );

    Ok(())
}

/// 创建环境过滤器
fn create_env_filter(level: &LogLevel) -> EnvFilter {
    // 格式：RUST_LOG=debug 或 RUST_LOG=cors_proxy=trace,reqwest=warn
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// 默认配置：应用代码使用指定级别，第三方库使用 WARN
fn default_directives(level: &LogLevel) -> String {
    format!(
        "cors_proxy={},hyper=warn,reqwest=warn,h2=warn,tokio=warn",
        level.as_str()
    )
}

fn create_console_text_layer<S>() -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(cfg!(debug_assertions))
        .with_thread_ids(false)
        .with_ansi(true)
        .with_span_events(if cfg!(debug_assertions) {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .boxed()
}

fn create_console_json_layer<S>() -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_writer(std::io::stdout)
        .with_target(cfg!(debug_assertions))
        .with_thread_ids(false)
        .with_ansi(false)
        .boxed()
}

/// 创建文件输出层（按天滚动、非阻塞写入）
fn create_file_layer<S>(
    log_dir: PathBuf,
    format: LogFormat,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let file_appender = rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = non_blocking(file_appender);

    // guard 必须活到进程结束，否则缓冲中的日志会丢失
    Box::leak(Box::new(guard));

    match format {
        LogFormat::Text => fmt::layer()
            .with_writer(non_blocking)
            .with_target(cfg!(debug_assertions))
            .with_thread_ids(false)
            .with_ansi(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .boxed(),
    }
}

/// 获取日志目录，不存在时创建
fn get_log_dir(file_path: Option<&str>) -> anyhow::Result<PathBuf> {
    let dir = match file_path {
        Some(path) => PathBuf::from(path),
        None => dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("无法获取用户主目录"))?
            .join(".cors-proxy")
            .join("logs"),
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| anyhow::anyhow!("无法创建日志目录 {}: {e}", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_quiet_dependencies() {
        let directives = default_directives(&LogLevel::Debug);
        assert!(directives.starts_with("cors_proxy=debug"));
        assert!(directives.contains("hyper=warn"));
        assert!(directives.contains("reqwest=warn"));
    }

    #[test]
    fn test_get_log_dir_creates_custom_path() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("nested").join("logs");

        let dir = get_log_dir(target.to_str()).unwrap();

        assert_eq!(dir, target);
        assert!(target.is_dir());
    }
}
