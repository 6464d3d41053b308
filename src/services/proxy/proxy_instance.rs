// 代理实例管理
//
// ProxyInstance 封装一个转发代理服务，负责：
// - HTTP 服务器的启动和停止
// - 请求的接收与处理流水线（CORS → 解析目标 → 授权 → 转发 → 过滤转发）

use anyhow::{Context, Result};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use reqwest::Client;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use super::utils::loop_detector::is_proxy_loop;
use super::utils::{error_responses, query, BoxBody};
use super::{authorizer, cors, forwarder, relay};
use crate::core::error::{AppResult, ErrorKind, ProxyError};
use crate::core::http::build_http_client;
use crate::models::proxy_config::ProxyConfig;

/// 单个请求处理所需的共享只读状态
pub struct ProxyContext {
    pub config: Arc<ProxyConfig>,
    pub client: Client,
    /// 实际监听地址，用于回环检测
    pub own_addr: SocketAddr,
}

/// 代理实例
pub struct ProxyInstance {
    config: Arc<ProxyConfig>,
    client: Client,
    server_handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
    local_addr: Arc<RwLock<Option<SocketAddr>>>,
}

impl ProxyInstance {
    /// 创建代理实例，出站客户端在此构建并在所有请求间复用
    pub fn new(config: ProxyConfig) -> AppResult<Self> {
        let client = build_http_client(config.upstream_proxy.as_deref())?;
        Ok(Self {
            config: Arc::new(config),
            client,
            server_handle: Arc::new(RwLock::new(None)),
            local_addr: Arc::new(RwLock::new(None)),
        })
    }

    /// 启动代理服务，返回实际监听地址（端口为 0 时由系统分配）
    pub async fn start(&self) -> Result<SocketAddr> {
        // 检查是否已经在运行
        {
            let handle = self.server_handle.read().await;
            if handle.is_some() {
                anyhow::bail!("代理实例已在运行");
            }
        }

        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("绑定地址 {addr} 失败"))?;
        let local_addr = listener.local_addr().context("读取监听地址失败")?;

        let allowlists = &self.config.allowlists;
        tracing::info!(
            addr = %local_addr,
            public = self.config.allow_public,
            endpoints = allowlists.endpoints.len(),
            paths = allowlists.paths.len(),
            content_types = allowlists.content_types.len(),
            "转发代理启动"
        );

        let ctx = Arc::new(ProxyContext {
            config: Arc::clone(&self.config),
            client: self.client.clone(),
            own_addr: local_addr,
        });

        let handle = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        let ctx = Arc::clone(&ctx);

                        tokio::spawn(async move {
                            let io = TokioIo::new(stream);
                            let service = service_fn(move |req| {
                                let ctx = Arc::clone(&ctx);
                                async move { handle_request(req, ctx).await }
                            });

                            if let Err(err) =
                                http1::Builder::new().serve_connection(io, service).await
                            {
                                tracing::warn!(peer = %peer, error = ?err, "处理连接失败");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "接受连接失败");
                    }
                }
            }
        });

        *self.server_handle.write().await = Some(handle);
        *self.local_addr.write().await = Some(local_addr);

        Ok(local_addr)
    }

    /// 停止代理服务（不再接受新连接）
    pub async fn stop(&self) -> Result<()> {
        let handle = self.server_handle.write().await.take();
        self.local_addr.write().await.take();

        if let Some(handle) = handle {
            handle.abort();
            tracing::info!("转发代理已停止");
        }

        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.server_handle.read().await.is_some()
    }

    /// 当前监听地址，未运行时为 None
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read().await
    }
}

/// 处理单个请求
async fn handle_request(
    req: Request<Incoming>,
    ctx: Arc<ProxyContext>,
) -> Result<Response<BoxBody>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    // 只记录主机和路径，查询串可能带敏感参数
    let target = query::target_url(req.uri().query())
        .map(|url| format!("{}{}", url.host_str().unwrap_or_default(), url.path()))
        .unwrap_or_default();

    let response = cors::allow_cors(req, |req| proxy_request(req, &ctx)).await;

    tracing::info!(
        method = %method,
        target = %target,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "请求完成"
    );

    Ok(response)
}

/// 代理处理函数（不含 CORS），所有错误在此转换为响应
pub async fn proxy_request<B>(req: Request<B>, ctx: &ProxyContext) -> Response<BoxBody> {
    match proxy_request_inner(req, ctx).await {
        Ok(res) => res,
        Err(e) => {
            match e.kind() {
                ErrorKind::MalformedInput | ErrorKind::Authorization => {
                    tracing::warn!(kind = e.kind().as_str(), reason = %e, "请求被拒绝");
                }
                ErrorKind::Upstream | ErrorKind::Transport => {
                    tracing::error!(kind = e.kind().as_str(), error = %e, "上游请求失败");
                }
            }
            error_responses::from_error(&e)
        }
    }
}

async fn proxy_request_inner<B>(
    req: Request<B>,
    ctx: &ProxyContext,
) -> Result<Response<BoxBody>, ProxyError> {
    let target = query::target_url(req.uri().query())?;

    // 授权必须在任何出站请求之前完成；白名单拒绝优先于回环检测
    let authorized = authorizer::authorize(&ctx.config.allowlists, req.method().clone(), target)?;

    if is_proxy_loop(authorized.target(), ctx.own_addr) {
        return Err(ProxyError::ProxyLoop(authorized.target().to_string()));
    }

    tracing::debug!(
        method = %authorized.method(),
        host = authorized.target().host_str().unwrap_or_default(),
        path = authorized.target().path(),
        "代理请求"
    );

    let upstream = forwarder::forward(&ctx.client, authorized).await?;
    relay::relay(upstream, &ctx.config.allowlists.content_types)
}
