use anyhow::Context;
use cors_proxy::{init_logger, LogConfig, ProxyConfig, ProxyInstance};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_config = LogConfig::from_env().context("读取日志配置失败")?;
    init_logger(&log_config).context("初始化日志系统失败")?;

    // 配置错误属于部署问题，启动时直接失败
    let config = ProxyConfig::from_env().context("读取代理配置失败")?;
    let proxy = ProxyInstance::new(config).context("创建代理实例失败")?;
    proxy.start().await.context("启动转发代理失败")?;

    tokio::signal::ctrl_c()
        .await
        .context("监听退出信号失败")?;

    tracing::info!("收到退出信号，正在停止");
    proxy.stop().await?;

    Ok(())
}
