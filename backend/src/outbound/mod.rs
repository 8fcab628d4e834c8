//! Outbound adapters implementing the student repository port.
//!
//! - **persistence**: PostgreSQL, MySQL and MongoDB repositories
//! - **cache**: the Redis repository
//! - **factory**: selects and builds one adapter from configuration
//!
//! Adapters translate between domain types and storage representations and
//! hold no business logic beyond each backend's merge rules.

pub mod cache;
pub mod factory;
pub mod persistence;
