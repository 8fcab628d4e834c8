//! HTTP inbound adapter exposing the student REST endpoints.

pub mod auth;
pub mod error;
pub mod health;
pub mod state;
pub mod students;

pub use error::ApiResult;
