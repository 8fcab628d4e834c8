//! Student use-cases on top of the repository port.
//!
//! The service is the only place repository outcomes are turned into
//! transport-agnostic [`Error`] values, so adapters stay free of status
//! concerns and handlers stay free of persistence concerns.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, warn};

use crate::domain::ports::{StudentRepository, StudentRepositoryError};
use crate::domain::{Error, Student};

/// Student service delegating storage to the configured repository.
#[derive(Clone)]
pub struct StudentService {
    repository: Arc<dyn StudentRepository>,
}

impl StudentService {
    /// Create a new service over the given repository.
    pub fn new(repository: Arc<dyn StudentRepository>) -> Self {
        Self { repository }
    }

    /// Map a repository failure onto a domain error.
    ///
    /// Validation and store failures share the internal error category;
    /// only malformed identifiers are reported as client mistakes.
    pub fn map_repository_error(error: StudentRepositoryError) -> Error {
        let kind = error.kind();
        match error {
            StudentRepositoryError::MalformedId { id, message } => {
                debug!(%id, %message, "rejected malformed student id");
                Error::invalid_request(format!("malformed student id: {message}"))
                    .with_details(json!({ "id": id }))
            }
            StudentRepositoryError::Validation { message } => {
                warn!(kind, %message, "student validation failed");
                Error::internal(format!("student validation failed: {message}"))
            }
            StudentRepositoryError::Connection { message }
            | StudentRepositoryError::Query { message } => {
                error!(kind, %message, "student repository failure");
                Error::internal(format!("student repository error: {message}"))
            }
        }
    }

    /// Return every stored student.
    pub async fn list(&self) -> Result<Vec<Student>, Error> {
        self.repository
            .list()
            .await
            .map_err(Self::map_repository_error)
    }

    /// Fetch a student, reporting an absent record as not found.
    pub async fn get(&self, id: &str) -> Result<Student, Error> {
        self.repository
            .get_by_id(id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("student {id} not found"))
                    .with_details(json!({ "id": id }))
            })
    }

    /// Create a student and return it with its assigned identifier.
    pub async fn create(&self, mut student: Student) -> Result<Student, Error> {
        self.repository
            .create(&mut student)
            .await
            .map_err(Self::map_repository_error)?;
        debug!(id = ?student.id, "student created");
        Ok(student)
    }

    /// Apply an update and echo the submitted record.
    pub async fn update(&self, student: Student) -> Result<Student, Error> {
        self.repository
            .update(&student)
            .await
            .map_err(Self::map_repository_error)?;
        Ok(student)
    }

    /// Delete a student by identifier.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.repository
            .delete(id)
            .await
            .map_err(Self::map_repository_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::MockStudentRepository;
    use crate::domain::{ErrorCode, StudentId};
    use rstest::rstest;

    fn service(mock: MockStudentRepository) -> StudentService {
        StudentService::new(Arc::new(mock))
    }

    #[rstest]
    #[case(StudentRepositoryError::malformed_id("zz", "bad"), ErrorCode::InvalidRequest)]
    #[case(StudentRepositoryError::validation("rollno"), ErrorCode::InternalError)]
    #[case(StudentRepositoryError::connection("down"), ErrorCode::InternalError)]
    #[case(StudentRepositoryError::query("boom"), ErrorCode::InternalError)]
    fn maps_repository_errors(#[case] error: StudentRepositoryError, #[case] code: ErrorCode) {
        assert_eq!(StudentService::map_repository_error(error).code(), code);
    }

    #[rstest]
    #[tokio::test]
    async fn absent_student_is_not_found() {
        let mut mock = MockStudentRepository::new();
        mock.expect_get_by_id().times(1).return_once(|id| {
            assert_eq!(id, "7");
            Ok(None)
        });

        let err = service(mock).get("7").await.expect_err("absent student");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn create_returns_populated_identifier() {
        let mut mock = MockStudentRepository::new();
        mock.expect_create().times(1).returning(|student| {
            student.id = Some(StudentId::from(1));
            Ok(())
        });

        let created = service(mock)
            .create(Student {
                roll_no: "1".into(),
                ..Student::default()
            })
            .await
            .expect("create succeeds");
        assert_eq!(created.id, Some(StudentId::from(1)));
    }

    #[rstest]
    #[tokio::test]
    async fn update_echoes_submitted_record() {
        let mut mock = MockStudentRepository::new();
        mock.expect_update().times(1).returning(|_| Ok(()));
        let student = Student {
            id: Some(StudentId::from(3)),
            name: "Jane Doe".into(),
            ..Student::default()
        };

        let updated = service(mock)
            .update(student.clone())
            .await
            .expect("update succeeds");
        assert_eq!(updated, student);
    }

    #[rstest]
    #[tokio::test]
    async fn store_failures_surface_as_internal_errors() {
        let mut mock = MockStudentRepository::new();
        mock.expect_list()
            .times(1)
            .return_once(|| Err(StudentRepositoryError::connection("refused")));

        let err = service(mock).list().await.expect_err("list fails");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_propagates_malformed_ids() {
        let mut mock = MockStudentRepository::new();
        mock.expect_delete()
            .times(1)
            .return_once(|_| Err(StudentRepositoryError::malformed_id("x", "bad")));

        let err = service(mock).delete("x").await.expect_err("delete fails");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
