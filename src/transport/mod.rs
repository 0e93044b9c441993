//! Network transport.
//!
//! The [`Transport`] trait is the seam between the pipeline and the network.
//! [`ReqwestTransport`] is the production implementation; tests substitute
//! their own to observe or script traffic.

pub mod headers;
mod http;

use async_trait::async_trait;

pub use http::{ReqwestTransport, ReqwestTransportBuilder};

use crate::error::Result;
use crate::request::PendingRequest;
use crate::response::RawResponse;

/// Executes one request and returns the raw response.
///
/// Implementations must not retry and must not interpret the status code:
/// a 404 is a successful exchange at this layer. Network failures surface as
/// [`Error::Timeout`](crate::Error::Timeout),
/// [`Error::Network`](crate::Error::Network) or
/// [`Error::Transport`](crate::Error::Transport).
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn send(&self, request: PendingRequest) -> Result<RawResponse>;
}

/// Blanket impl for `Arc<T>`.
#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: PendingRequest) -> Result<RawResponse> {
        (**self).send(request).await
    }
}
