//! Domain primitives, ports and use-cases.
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic error payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Student / StudentId: the managed record and its opaque identifier.
//! - StudentService: repository-backed use-cases consumed by adapters.

pub mod error;
pub mod password;
pub mod ports;
pub mod student;
pub mod student_service;

pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::student::{Student, StudentId, StudentValidationError};
pub use self::student_service::StudentService;
