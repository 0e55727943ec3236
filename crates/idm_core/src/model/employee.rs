//! Employee projection.

use super::{Entity, EntityId, EntityKind};
use serde::{Deserialize, Serialize};

/// Live employee row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EntityId,
    pub name: String,
    /// Unix epoch milliseconds, fixed at insert.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed by the store on mutation.
    pub updated_at: i64,
}

impl Entity for Employee {
    const KIND: EntityKind = EntityKind::Employee;

    fn from_columns(id: EntityId, name: String, created_at: i64, updated_at: i64) -> Self {
        Self {
            id,
            name,
            created_at,
            updated_at,
        }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
