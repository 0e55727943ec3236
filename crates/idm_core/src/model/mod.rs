//! Entity shapes for the identity-management collections.
//!
//! # Responsibility
//! - Define the read projections returned by repositories.
//! - Describe per-kind storage metadata (table, label).
//!
//! # Invariants
//! - `id`, `created_at` and `updated_at` are store-assigned.
//! - Soft-delete state is a query filter, never a projected field.

pub mod employee;
pub mod role;

use std::fmt::{Display, Formatter};

/// Store-assigned row identifier.
pub type EntityId = i64;

/// Collections backed by a soft-delete table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Employee,
    Role,
}

impl EntityKind {
    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Role => "role",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// Read projection of one live row.
///
/// Implemented by every kind a `SqliteEntityRepository` can serve.
pub trait Entity: Sized {
    const KIND: EntityKind;

    /// Builds the projection from selected columns, in select order.
    fn from_columns(id: EntityId, name: String, created_at: i64, updated_at: i64) -> Self;

    fn id(&self) -> EntityId;

    fn name(&self) -> &str;
}
