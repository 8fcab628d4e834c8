//! Test utilities for the students crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Only compiled for tests or with the `test-support` feature.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{StudentRepository, StudentRepositoryError};
use crate::domain::{Student, StudentId};

#[derive(Debug, Default)]
struct Records {
    next_id: i64,
    students: BTreeMap<i64, Student>,
}

/// Process-local repository with integer identifiers.
///
/// Updates replace the whole record, keep the stored hash when the payload
/// password is empty, and no-op on unknown ids.
#[derive(Debug, Default)]
pub struct InMemoryStudentRepository {
    records: Mutex<Records>,
}

impl InMemoryStudentRepository {
    fn records(&self) -> Result<MutexGuard<'_, Records>, StudentRepositoryError> {
        self.records
            .lock()
            .map_err(|_| StudentRepositoryError::connection("in-memory store poisoned"))
    }
}

fn parse_id(id: &str) -> Result<i64, StudentRepositoryError> {
    id.trim()
        .parse()
        .map_err(|err: std::num::ParseIntError| {
            StudentRepositoryError::malformed_id(id, err.to_string())
        })
}

#[async_trait]
impl StudentRepository for InMemoryStudentRepository {
    async fn list(&self) -> Result<Vec<Student>, StudentRepositoryError> {
        Ok(self.records()?.students.values().cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Student>, StudentRepositoryError> {
        let key = parse_id(id)?;
        Ok(self.records()?.students.get(&key).cloned())
    }

    async fn create(&self, student: &mut Student) -> Result<(), StudentRepositoryError> {
        student.prepare_for_insert()?;
        let mut records = self.records()?;
        records.next_id += 1;
        let id = records.next_id;
        student.id = Some(StudentId::from(id));
        records.students.insert(id, student.clone());
        Ok(())
    }

    async fn update(&self, student: &Student) -> Result<(), StudentRepositoryError> {
        let key = parse_id(student.require_id()?.as_str())?;
        let sealed = student.sealed_password_for_update()?;
        let mut records = self.records()?;
        let Some(existing) = records.students.get_mut(&key) else {
            return Ok(());
        };

        let password = sealed.unwrap_or_else(|| existing.password.clone());
        *existing = Student {
            id: Some(StudentId::from(key)),
            password,
            ..student.clone()
        };
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StudentRepositoryError> {
        let key = parse_id(id)?;
        self.records()?.students.remove(&key);
        Ok(())
    }
}
