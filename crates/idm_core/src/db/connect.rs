//! Pooled connection bootstrap for SQLite.
//!
//! # Responsibility
//! - Validate driver/DSN pairs coming out of config resolution.
//! - Open the store once, apply migrations, then hand out a shared pool.
//! - Configure per-connection pragmas required by repository behavior.
//!
//! # Invariants
//! - Pool limits are the `MAX_*`/`CONN_*` constants below, never config.
//! - Every pooled connection has `foreign_keys=ON` and a busy timeout.
//! - DSNs are never logged; they may carry credentials.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use crate::config::{find_project_root, load_profile_config, process_env, Config, EnvProfile};
use log::{error, info};
use r2d2::ManageConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::time::{Duration, Instant};

/// Idle connections the pool keeps warm.
pub const MAX_IDLE_CONNECTIONS: u32 = 5;
/// Upper bound on simultaneously open connections.
pub const MAX_OPEN_CONNECTIONS: u32 = 20;
/// Connections are recycled after this age regardless of activity.
pub const CONN_MAX_LIFETIME: Duration = Duration::from_secs(60);
/// Idle connections above the warm set are closed after this long.
pub const CONN_MAX_IDLE_TIME: Duration = Duration::from_secs(10 * 60);

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared, process-wide connection pool.
pub type DbPool = r2d2::Pool<SqliteConnectionManager>;
/// Connection checked out of [`DbPool`].
pub type PooledConn = r2d2::PooledConnection<SqliteConnectionManager>;

/// Store drivers this crate can establish connections for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbDriver {
    Sqlite,
}

impl DbDriver {
    /// Parses a `DB_DRIVER_NAME` value.
    pub fn parse(name: &str) -> DbResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(DbError::UnsupportedDriver(name.to_string())),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
        }
    }
}

/// Establishes the shared pool for `config`.
///
/// # Errors
/// - `UnsupportedDriver` / `MissingDsn` when the config is incomplete.
/// - `UnsharedMemoryDsn` when an in-memory DSN cannot be shared by the pool.
/// - `Sqlite` when the DSN cannot be opened or migrations fail.
/// - `Pool` when the pool cannot reach its warm size.
///
/// # Side effects
/// - Applies pending schema migrations.
/// - Emits `db_connect` logging events with duration and status.
pub fn connect_db_with_config(config: &Config) -> DbResult<DbPool> {
    let started_at = Instant::now();
    info!("event=db_connect module=db status=start");

    match build_pool(config) {
        Ok((driver, pool)) => {
            info!(
                "event=db_connect module=db status=ok driver={} max_open={} max_idle={} duration_ms={}",
                driver.as_str(),
                MAX_OPEN_CONNECTIONS,
                MAX_IDLE_CONNECTIONS,
                started_at.elapsed().as_millis()
            );
            Ok(pool)
        }
        Err(err) => {
            error!(
                "event=db_connect module=db status=error duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                error_code(&err),
                err
            );
            Err(err)
        }
    }
}

/// Establishes the shared pool or panics.
///
/// Connection setup is a one-time startup action; an unreachable store at
/// this point is unrecoverable and is not retried.
pub fn must_connect_db_with_config(config: &Config) -> DbPool {
    match connect_db_with_config(config) {
        Ok(pool) => pool,
        Err(err) => panic!("failed to connect to database: {err}"),
    }
}

/// Resolves config for `profile` from the project root and the process
/// environment, then connects or panics.
pub fn connect_db(profile: EnvProfile) -> DbPool {
    let root = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_project_root(&cwd))
        .unwrap_or_default();
    let config = load_profile_config(&root, profile, &process_env());
    must_connect_db_with_config(&config)
}

fn build_pool(config: &Config) -> DbResult<(DbDriver, DbPool)> {
    let driver = DbDriver::parse(&config.db_driver_name)?;
    let dsn = config.dsn.trim();
    if dsn.is_empty() {
        return Err(DbError::MissingDsn);
    }
    if is_unshared_memory_dsn(dsn) {
        return Err(DbError::UnsharedMemoryDsn);
    }

    let manager = SqliteConnectionManager::file(dsn).with_init(configure_connection);

    // Open outside the pool: r2d2 would otherwise retry until its checkout
    // timeout before reporting an unreachable DSN.
    let mut bootstrap = manager.connect()?;
    apply_migrations(&mut bootstrap)?;

    let pool = r2d2::Pool::builder()
        .max_size(MAX_OPEN_CONNECTIONS)
        .min_idle(Some(MAX_IDLE_CONNECTIONS))
        .max_lifetime(Some(CONN_MAX_LIFETIME))
        .idle_timeout(Some(CONN_MAX_IDLE_TIME))
        .build(manager)?;
    drop(bootstrap);

    Ok((driver, pool))
}

/// True for in-memory DSNs whose database is private to one connection.
fn is_unshared_memory_dsn(dsn: &str) -> bool {
    if dsn == ":memory:" {
        return true;
    }
    let Some(uri) = dsn.strip_prefix("file:") else {
        return false;
    };
    let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
    let params: Vec<&str> = query.split('&').collect();
    let in_memory = path == ":memory:" || params.contains(&"mode=memory");
    in_memory && !params.contains(&"cache=shared")
}

fn configure_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

fn error_code(err: &DbError) -> &'static str {
    match err {
        DbError::UnsupportedDriver(_) => "db_unsupported_driver",
        DbError::MissingDsn => "db_missing_dsn",
        DbError::UnsharedMemoryDsn => "db_unshared_memory_dsn",
        DbError::Sqlite(_) => "db_open_failed",
        DbError::Pool(_) => "db_pool_failed",
        DbError::UnsupportedSchemaVersion { .. } => "db_schema_too_new",
    }
}

#[cfg(test)]
mod tests {
    use super::{is_unshared_memory_dsn, DbDriver};
    use crate::db::DbError;

    #[test]
    fn driver_parse_accepts_sqlite_aliases() {
        assert_eq!(DbDriver::parse("sqlite").unwrap(), DbDriver::Sqlite);
        assert_eq!(DbDriver::parse(" SQLite3 ").unwrap(), DbDriver::Sqlite);
    }

    #[test]
    fn driver_parse_rejects_unknown_names() {
        let err = DbDriver::parse("postgres").unwrap_err();
        assert!(matches!(err, DbError::UnsupportedDriver(name) if name == "postgres"));
    }

    #[test]
    fn private_memory_dsns_are_detected() {
        assert!(is_unshared_memory_dsn(":memory:"));
        assert!(is_unshared_memory_dsn("file::memory:"));
        assert!(is_unshared_memory_dsn("file:idm?mode=memory"));
        assert!(is_unshared_memory_dsn("file:idm?mode=memory&cache=private"));
    }

    #[test]
    fn shared_memory_and_file_dsns_are_accepted() {
        assert!(!is_unshared_memory_dsn("file:idm?mode=memory&cache=shared"));
        assert!(!is_unshared_memory_dsn("file::memory:?cache=shared"));
        assert!(!is_unshared_memory_dsn("/var/lib/idm/idm.db"));
        assert!(!is_unshared_memory_dsn("file:/var/lib/idm/idm.db?mode=rwc"));
    }
}
