//! Group model — a named collection of principals.
//!
//! Groups scope organizationally; the permission evaluator never consults
//! them.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keyhub_schema::{EntityMeta, FieldKind, FieldMeta, Model};

use crate::id::GroupId;

/// A named collection of principals, many-to-many via
/// [`crate::GroupMember`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Primary key, assigned by the store.
    #[serde(default)]
    pub id: GroupId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
    /// Unique group name.
    pub name: String,
    /// Free-form extra payload.
    #[serde(default)]
    pub extra: String,
}

static GROUP_META: LazyLock<EntityMeta> = LazyLock::new(|| {
    EntityMeta::new(
        "groups",
        vec![
            FieldMeta::new("id", FieldKind::Integer).primary_key(),
            FieldMeta::new("created_at", FieldKind::Timestamp).json("createdAt"),
            FieldMeta::new("updated_at", FieldKind::Timestamp).json("updatedAt"),
            FieldMeta::new("name", FieldKind::Text),
            FieldMeta::new("extra", FieldKind::Text),
        ],
    )
});

impl Model for Group {
    fn meta() -> &'static EntityMeta {
        &GROUP_META
    }
}

impl Group {
    /// Create a new group with the given unique name.
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: GroupId::UNSET,
            created_at: now,
            updated_at: now,
            name: name.to_string(),
            extra: String::new(),
        }
    }
}
