//! Repository layer for the soft-delete collections.
//!
//! # Responsibility
//! - Define the single data-access contract shared by employees and roles.
//! - Build per-kind repositories around one shared connection pool.
//!
//! # Invariants
//! - Repositories return semantic errors (`NotFound`, `QueryBuild`) in
//!   addition to store transport errors.
//! - Repositories depend on a live pool, never on config resolution.

pub mod entity_repo;

use crate::db::DbPool;
use entity_repo::{EmployeeRepository, RoleRepository};

/// Every repository the application needs, sharing one pool.
#[derive(Clone)]
pub struct Repositories {
    pub employees: EmployeeRepository,
    pub roles: RoleRepository,
}

impl Repositories {
    pub fn new(pool: &DbPool) -> Self {
        Self {
            employees: EmployeeRepository::new(pool.clone()),
            roles: RoleRepository::new(pool.clone()),
        }
    }
}
