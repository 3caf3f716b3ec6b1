//! HTTP transport module.
//!
//! This module provides the `HttpTransport` seam used by the session manager
//! and `ReqwestTransport`, its reqwest-backed implementation. Credentials are
//! attached per request by a `RequestInterceptor` rather than stored as
//! client-wide default headers.

pub mod error;
pub mod transport;

pub use error::TransportError;
pub use transport::{HttpTransport, ReqwestTransport, DEFAULT_TIMEOUT_SECS};
