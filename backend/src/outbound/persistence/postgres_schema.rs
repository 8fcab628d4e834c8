//! Additive schema reconciliation for the PostgreSQL store.
//!
//! Creates the `students` table when missing and adds any missing column.
//! Nothing is ever dropped or retyped, so running it against a newer schema
//! is harmless.

use diesel_async::SimpleAsyncConnection;
use tracing::info;

use super::pool::{DbPool, PoolError};

/// Failures raised while reconciling the schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// No connection could be checked out.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// The server rejected a reconciliation statement.
    #[error("schema statement failed: {message}")]
    Statement { message: String },
}

/// Column definitions applied with `ADD COLUMN IF NOT EXISTS`.
const STUDENT_COLUMNS: &[(&str, &str)] = &[
    ("name", "TEXT NOT NULL DEFAULT ''"),
    ("email", "TEXT NOT NULL DEFAULT ''"),
    ("password", "TEXT NOT NULL DEFAULT ''"),
    ("rollno", "TEXT NOT NULL DEFAULT ''"),
    ("class", "TEXT NOT NULL DEFAULT ''"),
    ("optional_subjects", "TEXT[] NOT NULL DEFAULT '{}'"),
    ("student_rank", "INTEGER NOT NULL DEFAULT 0"),
];

/// Render the reconciliation script.
pub(crate) fn reconcile_sql() -> String {
    let mut sql = String::from("CREATE TABLE IF NOT EXISTS students (id SERIAL PRIMARY KEY);\n");
    for (column, definition) in STUDENT_COLUMNS {
        sql.push_str(&format!(
            "ALTER TABLE students ADD COLUMN IF NOT EXISTS {column} {definition};\n"
        ));
    }
    sql
}

/// Apply the reconciliation script on a pooled connection.
pub async fn reconcile_student_schema(pool: &DbPool) -> Result<(), SchemaError> {
    let mut conn = pool.get().await?;
    conn.batch_execute(&reconcile_sql())
        .await
        .map_err(|err| SchemaError::Statement {
            message: err.to_string(),
        })?;
    info!(table = "students", "postgres schema reconciled");
    Ok(())
}
