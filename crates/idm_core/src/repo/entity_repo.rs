//! Soft-delete repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide add/find/soft-delete APIs over one entity table.
//! - Keep SQL and placeholder details inside the persistence boundary.
//!
//! # Invariants
//! - Every read and delete is scoped to `is_deleted = 0`.
//! - Rows are never hard-deleted here.
//! - Empty live result sets are reported as `NotFound`, never `Ok(vec![])`.
//! - Silent deletes succeed regardless of how many rows matched.

use crate::db::{DbError, DbPool, InPredicate, PooledConn, QueryBuildError};
use crate::model::employee::Employee;
use crate::model::role::Role;
use crate::model::{Entity, EntityId, EntityKind};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::ops::Deref;
use std::time::{Duration, Instant};

const SELECT_COLUMNS: &str = "id, name, created_at, updated_at";
const NOW_MS_SQL: &str = "(CAST(strftime('%s', 'now') AS INTEGER) * 1000)";
/// VM instructions between deadline checks while a statement runs.
const DEADLINE_CHECK_OPS: i32 = 1_000;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by entity repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// No live row satisfied the lookup.
    NotFound(EntityKind),
    /// The id set could not be turned into a predicate; the store was not contacted.
    QueryBuild(QueryBuildError),
    /// Store failure propagated as-is.
    Db(DbError),
    /// Store failure annotated with the originating read operation.
    Query {
        kind: EntityKind,
        operation: &'static str,
        source: DbError,
    },
    /// The configured per-operation timeout elapsed.
    DeadlineExceeded {
        kind: EntityKind,
        operation: &'static str,
        phase: DeadlinePhase,
    },
}

/// Where an operation was when its deadline passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlinePhase {
    /// Waiting for a pooled connection.
    Checkout,
    /// Running the statement; interrupted by the store.
    Statement,
}

impl Display for DeadlinePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checkout => f.write_str("checkout"),
            Self::Statement => f.write_str("statement"),
        }
    }
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(kind) => write!(f, "{kind} not found"),
            Self::QueryBuild(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Query {
                kind,
                operation,
                source,
            } => write!(f, "{kind}_repo.{operation}: {source}"),
            Self::DeadlineExceeded {
                kind,
                operation,
                phase,
            } => write!(f, "{kind}_repo.{operation}: deadline exceeded during {phase}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::QueryBuild(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Query { source, .. } => Some(source),
            Self::NotFound(_) | Self::DeadlineExceeded { .. } => None,
        }
    }
}

impl From<QueryBuildError> for RepoError {
    fn from(value: QueryBuildError) -> Self {
        Self::QueryBuild(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Repository interface shared by every soft-delete collection.
pub trait EntityRepository<E: Entity> {
    /// Inserts a row named `name` and returns it with store-assigned fields.
    fn add(&self, name: &str) -> RepoResult<E>;
    /// Returns the live row with `id`.
    fn find_by_id(&self, id: EntityId) -> RepoResult<E>;
    /// Returns all live rows in storage order.
    fn find_all(&self) -> RepoResult<Vec<E>>;
    /// Returns the live rows among `ids`; missing ids are omitted.
    fn find_by_ids(&self, ids: &[EntityId]) -> RepoResult<Vec<E>>;
    /// Soft-deletes `id` if it is live. Zero matches is success.
    fn delete_by_id_silent(&self, id: EntityId) -> RepoResult<()>;
    /// Soft-deletes every live row among `ids`. Zero matches is success.
    fn delete_by_ids_silent(&self, ids: &[EntityId]) -> RepoResult<()>;
}

/// SQLite-backed repository for one entity kind over a shared pool.
pub struct SqliteEntityRepository<E> {
    pool: DbPool,
    timeout: Option<Duration>,
    _entity: PhantomData<fn() -> E>,
}

pub type EmployeeRepository = SqliteEntityRepository<Employee>;
pub type RoleRepository = SqliteEntityRepository<Role>;

impl<E> Clone for SqliteEntityRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            timeout: self.timeout,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> SqliteEntityRepository<E> {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            timeout: None,
            _entity: PhantomData,
        }
    }

    /// Bounds every subsequent operation by `timeout`, covering both pool
    /// checkout and statement execution.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn table(&self) -> &'static str {
        E::KIND.table()
    }

    fn checkout(&self, operation: &'static str) -> RepoResult<Checkout> {
        let Some(timeout) = self.timeout else {
            let conn = self.pool.get().map_err(DbError::from)?;
            return Ok(Checkout { conn, armed: false });
        };

        let deadline = Instant::now() + timeout;
        let conn = self
            .pool
            .get_timeout(timeout)
            .map_err(|err| {
                debug!(
                    "event=pool_checkout module=repo status=error table={} operation={} timeout_ms={} error={}",
                    self.table(),
                    operation,
                    timeout.as_millis(),
                    err
                );
                RepoError::DeadlineExceeded {
                    kind: E::KIND,
                    operation,
                    phase: DeadlinePhase::Checkout,
                }
            })?;
        conn.progress_handler(
            DEADLINE_CHECK_OPS,
            Some(move || Instant::now() >= deadline),
        );
        Ok(Checkout { conn, armed: true })
    }

    fn store_error(&self, operation: &'static str, err: rusqlite::Error) -> RepoError {
        if is_interrupted(&err) {
            return RepoError::DeadlineExceeded {
                kind: E::KIND,
                operation,
                phase: DeadlinePhase::Statement,
            };
        }
        RepoError::Db(DbError::Sqlite(err))
    }

    fn query_error(&self, operation: &'static str, err: rusqlite::Error) -> RepoError {
        match self.store_error(operation, err) {
            RepoError::Db(source) => RepoError::Query {
                kind: E::KIND,
                operation,
                source,
            },
            other => other,
        }
    }

    fn select_live(
        &self,
        operation: &'static str,
        conn: &Connection,
        predicate: Option<&InPredicate>,
    ) -> RepoResult<Vec<E>> {
        let mut sql = format!(
            "SELECT {SELECT_COLUMNS} FROM {} WHERE is_deleted = 0",
            self.table()
        );
        let binds: &[Value] = match predicate {
            Some(predicate) => {
                sql.push_str(" AND ");
                sql.push_str(predicate.sql());
                predicate.values()
            }
            None => &[],
        };

        let rows = query_entities::<E>(conn, &sql, binds)
            .map_err(|err| self.query_error(operation, err))?;

        if rows.is_empty() {
            return Err(RepoError::NotFound(E::KIND));
        }
        Ok(rows)
    }

    fn soft_delete(
        &self,
        operation: &'static str,
        conn: &Connection,
        predicate: &str,
        binds: &[Value],
    ) -> RepoResult<()> {
        let sql = format!(
            "UPDATE {} SET is_deleted = 1, updated_at = {NOW_MS_SQL} WHERE is_deleted = 0 AND {predicate};",
            self.table()
        );
        let affected = conn
            .execute(&sql, params_from_iter(binds))
            .map_err(|err| self.store_error(operation, err))?;
        debug!(
            "event=soft_delete module=repo status=ok table={} requested={} affected={}",
            self.table(),
            binds.len(),
            affected
        );
        Ok(())
    }
}

impl<E: Entity> EntityRepository<E> for SqliteEntityRepository<E> {
    fn add(&self, name: &str) -> RepoResult<E> {
        const OP: &str = "add";
        let conn = self.checkout(OP)?;
        let sql = format!(
            "INSERT INTO {} (name) VALUES (?1) RETURNING {SELECT_COLUMNS};",
            self.table()
        );
        conn.query_row(&sql, [name], parse_entity_row::<E>)
            .map_err(|err| self.store_error(OP, err))
    }

    fn find_by_id(&self, id: EntityId) -> RepoResult<E> {
        const OP: &str = "find_by_id";
        let conn = self.checkout(OP)?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM {} WHERE is_deleted = 0 AND id = ?1;",
            self.table()
        );
        match conn.query_row(&sql, [id], parse_entity_row::<E>) {
            Ok(entity) => Ok(entity),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(RepoError::NotFound(E::KIND)),
            Err(err) => Err(self.query_error(OP, err)),
        }
    }

    fn find_all(&self) -> RepoResult<Vec<E>> {
        const OP: &str = "find_all";
        let conn = self.checkout(OP)?;
        self.select_live(OP, &conn, None)
    }

    fn find_by_ids(&self, ids: &[EntityId]) -> RepoResult<Vec<E>> {
        const OP: &str = "find_by_ids";
        let predicate = InPredicate::build("id", ids)?;
        let conn = self.checkout(OP)?;
        self.select_live(OP, &conn, Some(&predicate))
    }

    fn delete_by_id_silent(&self, id: EntityId) -> RepoResult<()> {
        const OP: &str = "delete_by_id_silent";
        let conn = self.checkout(OP)?;
        self.soft_delete(OP, &conn, "id = ?", &[Value::Integer(id)])
    }

    fn delete_by_ids_silent(&self, ids: &[EntityId]) -> RepoResult<()> {
        const OP: &str = "delete_by_ids_silent";
        let predicate = InPredicate::build("id", ids)?;
        let conn = self.checkout(OP)?;
        self.soft_delete(OP, &conn, predicate.sql(), predicate.values())
    }
}

/// Pooled connection with an optional deadline handler that is cleared
/// before the connection returns to the pool.
struct Checkout {
    conn: PooledConn,
    armed: bool,
}

impl Deref for Checkout {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        if self.armed {
            self.conn.progress_handler(0, None::<fn() -> bool>);
        }
    }
}

fn query_entities<E: Entity>(
    conn: &Connection,
    sql: &str,
    binds: &[Value],
) -> rusqlite::Result<Vec<E>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(binds), parse_entity_row::<E>)?;
    let mut entities = Vec::new();
    for row in rows {
        entities.push(row?);
    }
    Ok(entities)
}

fn parse_entity_row<E: Entity>(row: &Row<'_>) -> rusqlite::Result<E> {
    Ok(E::from_columns(
        row.get("id")?,
        row.get("name")?,
        row.get("created_at")?,
        row.get("updated_at")?,
    ))
}

fn is_interrupted(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::OperationInterrupted
    )
}
