//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data`, so they depend on
//! the student use-cases and the token authority only and remain testable
//! without a live datastore.

use std::sync::Arc;

use crate::domain::StudentService;
use crate::domain::ports::StudentRepository;

use super::auth::TokenAuthority;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub students: Arc<StudentService>,
    pub tokens: Arc<TokenAuthority>,
}

impl HttpState {
    /// Construct state from a service and token authority.
    pub fn new(students: StudentService, tokens: TokenAuthority) -> Self {
        Self {
            students: Arc::new(students),
            tokens: Arc::new(tokens),
        }
    }

    /// Construct state directly over a repository.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use students::inbound::http::auth::TokenAuthority;
    /// use students::inbound::http::state::HttpState;
    /// use students::test_support::InMemoryStudentRepository;
    ///
    /// let state = HttpState::from_repository(
    ///     Arc::new(InMemoryStudentRepository::default()),
    ///     TokenAuthority::new("secret"),
    /// );
    /// let _students = state.students.clone();
    /// ```
    pub fn from_repository(repository: Arc<dyn StudentRepository>, tokens: TokenAuthority) -> Self {
        Self::new(StudentService::new(repository), tokens)
    }
}
