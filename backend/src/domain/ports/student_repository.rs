//! Port abstraction for student persistence adapters and their errors.
//!
//! Identifiers cross this boundary as strings. Each adapter parses them
//! under its own scheme and reports ids it cannot parse as
//! [`StudentRepositoryError::MalformedId`], which is distinct from a
//! well-formed id that matches nothing (`Ok(None)`).

use async_trait::async_trait;

use crate::domain::{Student, StudentValidationError};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by student repository adapters.
    pub enum StudentRepositoryError {
        /// A mandatory field was missing or the record could not be prepared.
        Validation { message: String } => "student validation failed: {message}",
        /// The identifier does not parse under the active backend's scheme.
        MalformedId { id: String, message: String } => "malformed student id {id}: {message}",
        /// Repository connection could not be established.
        Connection { message: String } => "student repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "student repository query failed: {message}",
    }
}

impl From<StudentValidationError> for StudentRepositoryError {
    fn from(value: StudentValidationError) -> Self {
        Self::validation(value.to_string())
    }
}

/// Uniform contract implemented by every storage backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Fetch every stored student.
    async fn list(&self) -> Result<Vec<Student>, StudentRepositoryError>;

    /// Fetch a student by identifier, returning `None` when nothing matches.
    async fn get_by_id(&self, id: &str) -> Result<Option<Student>, StudentRepositoryError>;

    /// Insert a new student.
    ///
    /// On success the identifier is populated in place and the password
    /// field holds the sealed hash.
    async fn create(&self, student: &mut Student) -> Result<(), StudentRepositoryError>;

    /// Apply an update using the backend's merge semantics.
    ///
    /// Updating an identifier that matches nothing is a silent no-op.
    async fn update(&self, student: &Student) -> Result<(), StudentRepositoryError>;

    /// Remove a student; removing an unknown identifier succeeds.
    async fn delete(&self, id: &str) -> Result<(), StudentRepositoryError>;
}
