//! HTTP Body 类型定义
//!
//! 所有响应（完整的错误体、空的预检响应、流式转发的上游响应）统一为 `BoxBody`

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Body, Frame};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pin_project! {
    pub struct BoxBody {
        #[pin]
        inner: Pin<Box<dyn Body<Data = Bytes, Error = BoxError> + Send>>,
    }
}

impl Body for BoxBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.project().inner.poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> hyper::body::SizeHint {
        self.inner.size_hint()
    }
}

/// 创建 BoxBody 的辅助函数
pub fn box_body<B>(body: B) -> BoxBody
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    BoxBody {
        inner: Box::pin(body.map_err(Into::into)),
    }
}

/// 空响应体
pub fn empty() -> BoxBody {
    box_body(Empty::<Bytes>::new())
}

/// 一次性写出的完整响应体
pub fn full(data: impl Into<Bytes>) -> BoxBody {
    box_body(Full::new(data.into()))
}

/// 按块转发的流式响应体，调用方连接可写时才拉取下一块
pub fn stream<S, E>(chunks: S) -> BoxBody
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    let frames = chunks
        .map_ok(Frame::data)
        .map_err(|e| -> BoxError { e.into() });
    box_body(StreamBody::new(frames))
}
