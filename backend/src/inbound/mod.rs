//! Inbound adapters that translate external requests into student
//! use-case calls while keeping framework details at the edge.

pub mod http;
