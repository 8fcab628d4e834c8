//! Student records service: repository port, datastore adapters and the
//! HTTP surface built on top of them.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use doc::ApiDoc;
pub use middleware::Trace;
