//! Relay core: gate, fetch and dispatch
//!
//! A [`Dispatcher`] turns one inbound frame into one outbound frame. Request
//! events go through the [`Fetcher`], which consults the [`Blacklist`] and then
//! drives an [`HttpTransport`] with retries, `Range` narrowing for oversized
//! responses and bounded restarts.
//!
//! The transport is a trait object so the fetch loop can be exercised without
//! a network; [`ReqwestTransport`] is the production implementation.

pub mod blacklist;
pub mod dispatcher;
pub mod fetcher;
pub mod range;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use blacklist::Blacklist;
pub use dispatcher::{Dispatcher, ResponseSink};
pub use fetcher::{BLACKLISTED_CAUSE, Fetcher, MASTER_MODE_CAUSE, RequestBuildError};
pub use range::ByteRange;
pub use transport::{
    HttpTransport, OutboundRequest, RESPONSE_TOO_LARGE, ReqwestTransport, TransportConfig,
    TransportError, TransportResponse,
};
