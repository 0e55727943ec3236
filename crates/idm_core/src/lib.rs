//! Data-access core for the identity-management service.
//! Owns config resolution, store bootstrap and the soft-delete repositories.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{load_config, load_profile_config, Config, EnvProfile};
pub use db::{connect_db, connect_db_with_config, must_connect_db_with_config, DbError, DbPool};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::employee::Employee;
pub use model::role::Role;
pub use model::{Entity, EntityId, EntityKind};
pub use repo::entity_repo::{
    DeadlinePhase, EmployeeRepository, EntityRepository, RepoError, RepoResult, RoleRepository,
    SqliteEntityRepository,
};
pub use repo::Repositories;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
