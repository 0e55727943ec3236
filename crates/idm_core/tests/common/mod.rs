#![allow(dead_code)]

use idm_core::db::{connect_db_with_config, DbPool};
use idm_core::{Config, Entity, EntityId, EntityRepository, SqliteEntityRepository};
use tempfile::TempDir;

/// Pool over a fresh on-disk database; keep the `TempDir` alive for the test.
pub fn test_pool() -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(&dir, "idm_test.db");
    let pool = connect_db_with_config(&config).unwrap();
    (dir, pool)
}

pub fn sqlite_config(dir: &TempDir, file_name: &str) -> Config {
    Config {
        db_driver_name: "sqlite".to_string(),
        dsn: dir.path().join(file_name).to_str().unwrap().to_string(),
    }
}

/// Inserts `name` and returns its store-assigned id.
pub fn add<E: Entity>(repo: &SqliteEntityRepository<E>, name: &str) -> EntityId {
    repo.add(name).unwrap().id()
}

pub fn names<E: Entity>(entities: &[E]) -> Vec<&str> {
    entities.iter().map(Entity::name).collect()
}

pub fn ids<E: Entity>(entities: &[E]) -> Vec<EntityId> {
    entities.iter().map(Entity::id).collect()
}

/// Reads the raw soft-delete flag, bypassing repository filters.
pub fn raw_is_deleted(pool: &DbPool, table: &str, id: EntityId) -> bool {
    let conn = pool.get().unwrap();
    conn.query_row(
        &format!("SELECT is_deleted FROM {table} WHERE id = ?1;"),
        [id],
        |row| row.get::<_, i64>(0),
    )
    .map(|flag| flag == 1)
    .unwrap()
}
