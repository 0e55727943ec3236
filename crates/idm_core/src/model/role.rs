//! Role projection.

use super::{Entity, EntityId, EntityKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: EntityId,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entity for Role {
    const KIND: EntityKind = EntityKind::Role;

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
