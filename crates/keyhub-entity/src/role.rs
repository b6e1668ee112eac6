//! Role model — a named, labeled set of permissions.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keyhub_schema::{EntityMeta, FieldKind, FieldMeta, Model};

use crate::id::RoleId;

/// A named set of permissions, many-to-many with principals via
/// [`crate::UserRole`] and with permissions via [`crate::RolePermission`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Primary key, assigned by the store.
    #[serde(default)]
    pub id: RoleId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
    /// Unique role name.
    pub name: String,
    /// Human-readable label.
    pub label: String,
}

static ROLE_META: LazyLock<EntityMeta> = LazyLock::new(|| {
    EntityMeta::new(
        "roles",
        vec![
            FieldMeta::new("id", FieldKind::Integer).primary_key(),
            FieldMeta::new("created_at", FieldKind::Timestamp).json("createdAt"),
            FieldMeta::new("updated_at", FieldKind::Timestamp).json("updatedAt"),
            FieldMeta::new("name", FieldKind::Text),
            FieldMeta::new("label", FieldKind::Text),
        ],
    )
});

impl Model for Role {
    fn meta() -> &'static EntityMeta {
        &ROLE_META
    }
}

impl Role {
    /// Create a new role.
    pub fn new(name: &str, label: &str) -> Self {
        let now = Utc::now();
        Self {
            id: RoleId::UNSET,
            created_at: now,
            updated_at: now,
            name: name.to_string(),
            label: label.to_string(),
        }
    }
}
