//! Transport abstraction.
//!
//! The orchestrator never touches the network directly: it hands a fresh
//! request copy and the chosen egress path to a [`Transport`]. The
//! reqwest-backed [`HttpTransport`] is the production implementation; tests
//! substitute scripted transports.

mod error;
mod http;
mod request;

pub use error::TransportError;
pub use http::HttpTransport;
pub use request::{OutboundRequest, OutboundResponse, RequestOptions};

use async_trait::async_trait;

/// Sends one request through one egress path.
///
/// # Cancellation Safety
///
/// Implementations must be cancellation-safe: dropping the future aborts the
/// in-flight send.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send `request` through the proxy at `egress`, or directly when `None`.
    ///
    /// The egress assignment applies to this call only; implementations
    /// must not change any shared default.
    async fn send(
        &self,
        request: OutboundRequest,
        egress: Option<&str>,
    ) -> Result<OutboundResponse, TransportError>;
}
