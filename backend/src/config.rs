//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `STUDENTS_*` environment variables, configuration files
//! and command-line flags. Required values are optional at load time so the
//! binary can report every missing key in one error.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::factory::{
    DEFAULT_MONGO_COLLECTION, DEFAULT_MONGO_DATABASE, FactoryError, StoreConfig, StoreKind,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Problems found while turning loaded settings into runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A required key was not supplied.
    #[error("missing required setting {key}")]
    Missing { key: &'static str },
    /// A value was supplied but could not be parsed.
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Configuration values controlling the student service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STUDENTS")]
pub struct AppSettings {
    /// Datastore selector, e.g. `DatabaseTypeMongoDB` or `postgres`.
    pub db_type: Option<String>,
    /// Driver connection string for the selected datastore.
    pub db_connection_string: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Shared secret used to verify bearer tokens.
    pub jwt_secret: Option<String>,
    /// MongoDB database name.
    pub mongo_database: Option<String>,
    /// MongoDB collection name.
    pub mongo_collection: Option<String>,
}

impl AppSettings {
    /// Build the repository factory input.
    pub fn store_config(&self) -> Result<StoreConfig, SettingsError> {
        let raw_kind = self
            .db_type
            .as_deref()
            .ok_or(SettingsError::Missing { key: "db_type" })?;
        let kind: StoreKind = raw_kind.parse().map_err(|err: FactoryError| {
            SettingsError::Invalid {
                key: "db_type",
                message: err.to_string(),
            }
        })?;
        let connection = self
            .db_connection_string
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or(SettingsError::Missing {
                key: "db_connection_string",
            })?;

        Ok(StoreConfig::new(kind, connection)
            .with_mongo_namespace(self.mongo_database(), self.mongo_collection()))
    }

    /// Return the bind address, falling back to `0.0.0.0:8000`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
            .map_err(|err: std::net::AddrParseError| SettingsError::Invalid {
                key: "bind_addr",
                message: err.to_string(),
            })
    }

    /// Return the bearer token secret.
    pub fn jwt_secret(&self) -> Result<&str, SettingsError> {
        self.jwt_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or(SettingsError::Missing { key: "jwt_secret" })
    }

    /// Return the MongoDB database name, falling back to `students`.
    pub fn mongo_database(&self) -> &str {
        self.mongo_database
            .as_deref()
            .unwrap_or(DEFAULT_MONGO_DATABASE)
    }

    /// Return the MongoDB collection name, falling back to `collection`.
    pub fn mongo_collection(&self) -> &str {
        self.mongo_collection
            .as_deref()
            .unwrap_or(DEFAULT_MONGO_COLLECTION)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for service configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 6] = [
        "STUDENTS_DB_TYPE",
        "STUDENTS_DB_CONNECTION_STRING",
        "STUDENTS_BIND_ADDR",
        "STUDENTS_JWT_SECRET",
        "STUDENTS_MONGO_DATABASE",
        "STUDENTS_MONGO_COLLECTION",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("students")]).expect("config should load")
    }

    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        KEYS.iter()
            .map(|key| {
                let value = overrides
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| (*value).to_owned());
                (*key, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("default bind addr"),
            "0.0.0.0:8000".parse::<SocketAddr>().expect("socket addr")
        );
        assert_eq!(settings.mongo_database(), "students");
        assert_eq!(settings.mongo_collection(), "collection");
        assert_eq!(
            settings.store_config(),
            Err(SettingsError::Missing { key: "db_type" })
        );
        assert_eq!(
            settings.jwt_secret(),
            Err(SettingsError::Missing { key: "jwt_secret" })
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("STUDENTS_DB_TYPE", "DatabaseTypeMongoDB"),
            ("STUDENTS_DB_CONNECTION_STRING", "mongodb://localhost:27017"),
            ("STUDENTS_BIND_ADDR", "127.0.0.1:9000"),
            ("STUDENTS_JWT_SECRET", "hush"),
            ("STUDENTS_MONGO_DATABASE", "school"),
        ]));

        let settings = load_from_empty_args();
        let store = settings.store_config().expect("store config");
        assert_eq!(store.kind, StoreKind::MongoDb);
        assert_eq!(store.connection, "mongodb://localhost:27017");
        assert_eq!(store.mongo_database, "school");
        assert_eq!(store.mongo_collection, "collection");
        assert_eq!(settings.jwt_secret(), Ok("hush"));
        assert_eq!(settings.bind_addr().expect("bind addr").port(), 9000);
    }

    #[rstest]
    fn unknown_database_type_is_invalid() {
        let _guard = lock_env(env_with(&[
            ("STUDENTS_DB_TYPE", "DatabaseTypeOracle"),
            ("STUDENTS_DB_CONNECTION_STRING", "x"),
        ]));

        let settings = load_from_empty_args();
        assert!(matches!(
            settings.store_config(),
            Err(SettingsError::Invalid { key: "db_type", .. })
        ));
    }
}
