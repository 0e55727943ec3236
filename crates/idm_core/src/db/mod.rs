//! Relational store bootstrap, pooling and query-building helpers.
//!
//! # Responsibility
//! - Establish the shared SQLite connection pool from a resolved `Config`.
//! - Apply schema migrations in deterministic order.
//! - Build parameterized predicates for variable-length value sets.
//!
//! # Invariants
//! - Pool sizing is fixed policy and never derived from configuration.
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories never receive a pool whose migrations have not succeeded.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod connect;
pub mod migrations;
pub mod predicate;

pub use connect::{
    connect_db, connect_db_with_config, must_connect_db_with_config, DbDriver, DbPool,
    PooledConn, CONN_MAX_IDLE_TIME, CONN_MAX_LIFETIME, MAX_IDLE_CONNECTIONS,
    MAX_OPEN_CONNECTIONS,
};
pub use predicate::{InPredicate, QueryBuildError};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Pool(r2d2::Error),
    UnsupportedDriver(String),
    MissingDsn,
    /// In-memory DSN without `cache=shared`; each pooled connection would
    /// open its own empty database.
    UnsharedMemoryDsn,
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Pool(err) => write!(f, "connection pool: {err}"),
            Self::UnsupportedDriver(name) => {
                write!(f, "unsupported database driver `{name}`; expected sqlite")
            }
            Self::MissingDsn => write!(f, "database DSN is empty"),
            Self::UnsharedMemoryDsn => write!(
                f,
                "in-memory database DSN must be a `file:` URI with `cache=shared` to be pooled"
            ),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Pool(err) => Some(err),
            Self::UnsupportedDriver(_)
            | Self::MissingDsn
            | Self::UnsharedMemoryDsn
            | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<r2d2::Error> for DbError {
    fn from(value: r2d2::Error) -> Self {
        Self::Pool(value)
    }
}
