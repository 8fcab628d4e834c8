//! Shared mapping from relational driver errors to repository errors.

use tracing::debug;

use crate::domain::ports::StudentRepositoryError;

use super::pool::PoolError;

/// Map pool errors into repository connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> StudentRepositoryError {
    StudentRepositoryError::connection(error.message())
}

/// Map Diesel errors into repository errors.
///
/// `NotFound` is not expected here: lookups use `.optional()` so that an
/// absent row surfaces as `Ok(None)` instead.
pub(crate) fn map_diesel_error(error: diesel::result::Error) -> StudentRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => StudentRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => StudentRepositoryError::query("database query error"),
        DieselError::DeserializationError(err) => {
            StudentRepositoryError::query(format!("row decoding failed: {err}"))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            StudentRepositoryError::connection("database connection error")
        }
        _ => StudentRepositoryError::query("database error"),
    }
}

/// Map sqlx errors into repository errors.
pub(crate) fn map_sqlx_error(error: sqlx::Error) -> StudentRepositoryError {
    debug!(error = %error, "sqlx operation failed");
    match error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StudentRepositoryError::connection("database connection error")
        }
        sqlx::Error::Tls(_) => StudentRepositoryError::connection("database tls error"),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StudentRepositoryError::query("row decoding failed")
        }
        _ => StudentRepositoryError::query("database error"),
    }
}
