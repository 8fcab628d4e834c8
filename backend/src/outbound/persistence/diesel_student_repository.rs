//! PostgreSQL-backed `StudentRepository` implementation using Diesel ORM.
//!
//! Identifiers are `SERIAL` integers. Updates follow "non-zero fields
//! overwrite": empty strings, an empty subject list and a zero rank in the
//! payload leave the stored column untouched.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{StudentRepository, StudentRepositoryError};
use crate::domain::{Student, StudentId};

use super::models::{NewStudentRow, StudentChangeset, StudentRow};
use super::pool::DbPool;
use super::schema::students;
use super::student_error_mapping::{map_diesel_error, map_pool_error};

/// Diesel-backed implementation of the `StudentRepository` port.
#[derive(Clone)]
pub struct DieselStudentRepository {
    pool: DbPool,
}

impl DieselStudentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Parse an externally visible id into the `SERIAL` key space.
pub(crate) fn parse_serial_id(id: &str) -> Result<i32, StudentRepositoryError> {
    id.trim()
        .parse::<i32>()
        .map_err(|err| StudentRepositoryError::malformed_id(id, err.to_string()))
}

#[async_trait]
impl StudentRepository for DieselStudentRepository {
    async fn list(&self) -> Result<Vec<Student>, StudentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<StudentRow> = students::table
            .select(StudentRow::as_select())
            .order(students::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Student::from).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Student>, StudentRepositoryError> {
        let key = parse_serial_id(id)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<StudentRow> = students::table
            .find(key)
            .select(StudentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(Student::from))
    }

    async fn create(&self, student: &mut Student) -> Result<(), StudentRepositoryError> {
        student.prepare_for_insert()?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let id: i32 = diesel::insert_into(students::table)
            .values(NewStudentRow::from(&*student))
            .returning(students::id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        student.id = Some(StudentId::from(i64::from(id)));
        Ok(())
    }

    async fn update(&self, student: &Student) -> Result<(), StudentRepositoryError> {
        let key = parse_serial_id(student.require_id()?.as_str())?;
        let password = student.sealed_password_for_update()?;
        let changeset = StudentChangeset::from_payload(student, password);
        if changeset.is_empty() {
            debug!(id = key, "update payload carries no non-zero fields");
            return Ok(());
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::update(students::table.find(key))
            .set(&changeset)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if affected == 0 {
            debug!(id = key, "update matched no student");
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StudentRepositoryError> {
        let key = parse_serial_id(id)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::delete(students::table.find(key))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
