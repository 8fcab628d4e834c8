//! MySQL-backed `StudentRepository` implementation using sqlx.
//!
//! Identifiers are `AUTO_INCREMENT` integers read back through
//! `LAST_INSERT_ID`. The subject list lives in a JSON column and is
//! marshalled explicitly on every read and write. Updates overwrite every
//! column except the password, which is kept when the payload omits it.

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::{debug, info};

use crate::domain::ports::{StudentRepository, StudentRepositoryError};
use crate::domain::{Student, StudentId};

use super::student_error_mapping::map_sqlx_error;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS students (
    id INT AUTO_INCREMENT PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    password VARCHAR(255) NOT NULL,
    rollno VARCHAR(20) NOT NULL,
    class VARCHAR(50) NOT NULL,
    optional_subjects JSON,
    student_rank INT
)";

const SELECT_COLUMNS: &str = "SELECT id, name, email, password, rollno, class, \
     CAST(optional_subjects AS CHAR) AS optional_subjects, student_rank FROM students";

/// Row read from the MySQL `students` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct MySqlStudentRow {
    id: i32,
    name: String,
    email: String,
    password: String,
    rollno: String,
    class: String,
    optional_subjects: Option<String>,
    student_rank: Option<i32>,
}

/// Decode the JSON subject column; `NULL` and JSON `null` both mean empty.
fn decode_subjects(raw: Option<&str>) -> Result<Vec<String>, StudentRepositoryError> {
    match raw.map(str::trim) {
        None | Some("") | Some("null") => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).map_err(|err| {
            StudentRepositoryError::query(format!("malformed optional_subjects column: {err}"))
        }),
    }
}

fn encode_subjects(subjects: &[String]) -> Result<String, StudentRepositoryError> {
    serde_json::to_string(subjects).map_err(|err| {
        StudentRepositoryError::query(format!("failed to encode optional_subjects: {err}"))
    })
}

impl TryFrom<MySqlStudentRow> for Student {
    type Error = StudentRepositoryError;

    fn try_from(row: MySqlStudentRow) -> Result<Self, Self::Error> {
        let optional_subjects = decode_subjects(row.optional_subjects.as_deref())?;
        Ok(Self {
            id: Some(StudentId::from(i64::from(row.id))),
            email: row.email,
            password: row.password,
            name: row.name,
            roll_no: row.rollno,
            class: row.class,
            optional_subjects,
            rank: row.student_rank.unwrap_or_default(),
        })
    }
}

/// Column values bound by `update`.
///
/// `password` is `None` when the stored hash must be kept, which the
/// statement expresses as `COALESCE(?, password)`.
#[derive(Debug)]
struct UpdateBindings {
    password: Option<String>,
    optional_subjects: String,
}

impl UpdateBindings {
    fn from_student(student: &Student) -> Result<Self, StudentRepositoryError> {
        Ok(Self {
            password: student.sealed_password_for_update()?,
            optional_subjects: encode_subjects(&student.optional_subjects)?,
        })
    }
}

/// Parse an externally visible id into the `AUTO_INCREMENT` key space.
fn parse_auto_increment_id(id: &str) -> Result<i32, StudentRepositoryError> {
    id.trim()
        .parse::<i32>()
        .map_err(|err| StudentRepositoryError::malformed_id(id, err.to_string()))
}

/// sqlx-backed implementation of the `StudentRepository` port for MySQL.
#[derive(Clone)]
pub struct MySqlStudentRepository {
    pool: MySqlPool,
}

impl MySqlStudentRepository {
    /// Wrap an existing pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `url`.
    pub async fn connect(url: &str) -> Result<Self, StudentRepositoryError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|err| StudentRepositoryError::connection(err.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Create the `students` table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StudentRepositoryError> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        info!(table = "students", "mysql schema ensured");
        Ok(())
    }
}

#[async_trait]
impl StudentRepository for MySqlStudentRepository {
    async fn list(&self) -> Result<Vec<Student>, StudentRepositoryError> {
        let rows: Vec<MySqlStudentRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY id"))
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        rows.into_iter().map(Student::try_from).collect()
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Student>, StudentRepositoryError> {
        let key = parse_auto_increment_id(id)?;
        let row: Option<MySqlStudentRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?"))
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        row.map(Student::try_from).transpose()
    }

    async fn create(&self, student: &mut Student) -> Result<(), StudentRepositoryError> {
        student.prepare_for_insert()?;
        let subjects = encode_subjects(&student.optional_subjects)?;

        let result = sqlx::query(
            "INSERT INTO students \
             (name, email, password, rollno, class, optional_subjects, student_rank) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.password)
        .bind(&student.roll_no)
        .bind(&student.class)
        .bind(subjects)
        .bind(student.rank)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let id = i64::try_from(result.last_insert_id()).map_err(|err| {
            StudentRepositoryError::query(format!("insert id out of range: {err}"))
        })?;
        student.id = Some(StudentId::from(id));
        Ok(())
    }

    async fn update(&self, student: &Student) -> Result<(), StudentRepositoryError> {
        let key = parse_auto_increment_id(student.require_id()?.as_str())?;
        let bindings = UpdateBindings::from_student(student)?;

        let result = sqlx::query(
            "UPDATE students SET name = ?, email = ?, \
             password = COALESCE(?, password), rollno = ?, class = ?, \
             optional_subjects = ?, student_rank = ? WHERE id = ?",
        )
        .bind(&student.name)
        .bind(&student.email)
        .bind(bindings.password)
        .bind(&student.roll_no)
        .bind(&student.class)
        .bind(bindings.optional_subjects)
        .bind(student.rank)
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            debug!(id = key, "update matched no student");
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StudentRepositoryError> {
        let key = parse_auto_increment_id(id)?;
        sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}
