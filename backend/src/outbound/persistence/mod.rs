//! Database-backed student repositories.
//!
//! - **PostgreSQL** via Diesel with `diesel-async` and `bb8` pooling, using
//!   additive schema reconciliation at startup.
//! - **MySQL** via `sqlx`, creating its fixed table when missing.
//! - **MongoDB** via the official driver's internally pooled client.
//!
//! Row and document types stay private to each adapter; only domain types
//! cross the port.

mod diesel_student_repository;
mod models;
mod mongo_student_repository;
mod mysql_student_repository;
mod pool;
mod postgres_schema;
mod schema;
mod student_error_mapping;

pub use diesel_student_repository::DieselStudentRepository;
pub use mongo_student_repository::MongoStudentRepository;
pub use mysql_student_repository::MySqlStudentRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
pub use postgres_schema::{SchemaError, reconcile_student_schema};
