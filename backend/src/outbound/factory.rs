//! Repository selection and construction.
//!
//! The process builds exactly one repository at startup. Construction opens
//! the backend's pool or client, proves it is reachable, and for the
//! relational engines prepares the schema. Any failure here is fatal to the
//! binary.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::domain::ports::{StudentRepository, StudentRepositoryError};

use super::cache::RedisStudentRepository;
use super::persistence::{
    DbPool, DieselStudentRepository, MongoStudentRepository, MySqlStudentRepository, PoolConfig,
    reconcile_student_schema,
};

/// Default MongoDB database name.
pub const DEFAULT_MONGO_DATABASE: &str = "students";
/// Default MongoDB collection name.
pub const DEFAULT_MONGO_COLLECTION: &str = "collection";

/// Supported datastore kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    MongoDb,
    MySql,
    Postgres,
    Redis,
}

impl StoreKind {
    /// Short lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MongoDb => "mongodb",
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Redis => "redis",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreKind {
    type Err = FactoryError;

    /// Accepts the `DatabaseType*` selectors and short names, ignoring case.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised = value.trim().to_ascii_lowercase();
        let name = normalised
            .strip_prefix("databasetype")
            .unwrap_or(normalised.as_str());
        match name {
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            "mysql" => Ok(Self::MySql),
            "postgresql" | "postgres" => Ok(Self::Postgres),
            "redis" => Ok(Self::Redis),
            _ => Err(FactoryError::UnsupportedKind {
                kind: value.to_owned(),
            }),
        }
    }
}

/// Failures raised while building a repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactoryError {
    /// The configured kind names no known backend.
    #[error("unsupported database type: {kind}")]
    UnsupportedKind { kind: String },
    /// The backend could not be reached.
    #[error("{kind} connection failed: {message}")]
    Connection { kind: StoreKind, message: String },
    /// Schema preparation failed.
    #[error("{kind} schema bootstrap failed: {message}")]
    SchemaBootstrap { kind: StoreKind, message: String },
}

impl FactoryError {
    fn connection(kind: StoreKind, message: impl fmt::Display) -> Self {
        Self::Connection {
            kind,
            message: message.to_string(),
        }
    }

    fn schema(kind: StoreKind, message: impl fmt::Display) -> Self {
        Self::SchemaBootstrap {
            kind,
            message: message.to_string(),
        }
    }
}

/// Inputs required to build a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub connection: String,
    pub mongo_database: String,
    pub mongo_collection: String,
}

impl StoreConfig {
    /// Create a configuration with the default MongoDB namespace.
    pub fn new(kind: StoreKind, connection: impl Into<String>) -> Self {
        Self {
            kind,
            connection: connection.into(),
            mongo_database: DEFAULT_MONGO_DATABASE.to_owned(),
            mongo_collection: DEFAULT_MONGO_COLLECTION.to_owned(),
        }
    }

    /// Override the MongoDB database and collection.
    pub fn with_mongo_namespace(
        mut self,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        self.mongo_database = database.into();
        self.mongo_collection = collection.into();
        self
    }
}

/// Build the repository selected by `config`.
///
/// # Errors
///
/// Returns [`FactoryError::Connection`] when the backend is unreachable and
/// [`FactoryError::SchemaBootstrap`] when relational schema preparation
/// fails.
pub async fn connect_student_repository(
    config: &StoreConfig,
) -> Result<Arc<dyn StudentRepository>, FactoryError> {
    let kind = config.kind;
    let connect_err = |err: StudentRepositoryError| FactoryError::connection(kind, err);

    let repository: Arc<dyn StudentRepository> = match kind {
        StoreKind::MongoDb => {
            let repo = MongoStudentRepository::connect(
                &config.connection,
                &config.mongo_database,
                &config.mongo_collection,
            )
            .await
            .map_err(connect_err)?;
            repo.ping().await.map_err(connect_err)?;
            Arc::new(repo)
        }
        StoreKind::MySql => {
            let repo = MySqlStudentRepository::connect(&config.connection)
                .await
                .map_err(connect_err)?;
            repo.ensure_schema()
                .await
                .map_err(|err| FactoryError::schema(kind, err))?;
            Arc::new(repo)
        }
        StoreKind::Postgres => {
            let pool = DbPool::new(PoolConfig::new(config.connection.as_str()))
                .await
                .map_err(|err| FactoryError::connection(kind, err))?;
            pool.ping()
                .await
                .map_err(|err| FactoryError::connection(kind, err))?;
            reconcile_student_schema(&pool)
                .await
                .map_err(|err| FactoryError::schema(kind, err))?;
            Arc::new(DieselStudentRepository::new(pool))
        }
        StoreKind::Redis => {
            let repo = RedisStudentRepository::connect(&config.connection)
                .await
                .map_err(connect_err)?;
            repo.ping().await.map_err(connect_err)?;
            Arc::new(repo)
        }
    };

    info!(kind = %kind, "student repository ready");
    Ok(repository)
}
