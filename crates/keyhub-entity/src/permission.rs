//! Permission model and positional policy-slot matching.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keyhub_schema::{EntityMeta, FieldKind, FieldMeta, Model};

use crate::id::PermissionId;

/// Maximum number of ordered policy slots a permission carries.
pub const MAX_POLICY_SLOTS: usize = 3;

/// An action descriptor: up to three ordered free-form matching tokens
/// (e.g. method + resource path, or arbitrary category tags) compared
/// positionally against a permission's policy slots.
#[derive(Debug, Clone)]
pub struct Action(Vec<String>);

impl Action {
    /// Build an action from its ordered slots.
    pub fn new<S: Into<String>>(slots: impl IntoIterator<Item = S>) -> Self {
        Self(slots.into_iter().map(Into::into).collect())
    }

    /// The explicit all-empty action, matched only by no-policy permissions.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// The ordered slots.
    pub fn slots(&self) -> &[String] {
        &self.0
    }
}

/// An action descriptor with ≤3 ordered policy slots, an optional one-level
/// parent, and the `anonymous` superset flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    /// Primary key, assigned by the store.
    #[serde(default)]
    pub id: PermissionId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
    /// Unique permission name.
    pub name: String,
    /// Parent permission; deleting the parent cascades to its children.
    #[serde(default)]
    pub parent_id: Option<PermissionId>,
    /// Grants any authenticated holder, regardless of policy values.
    #[serde(default)]
    pub anonymous: bool,
    /// First policy slot.
    #[serde(default)]
    pub p1: String,
    /// Second policy slot.
    #[serde(default)]
    pub p2: String,
    /// Third policy slot.
    #[serde(default)]
    pub p3: String,
}

static PERMISSION_META: LazyLock<EntityMeta> = LazyLock::new(|| {
    EntityMeta::new(
        "permissions",
        vec![
            FieldMeta::new("id", FieldKind::Integer).primary_key(),
            FieldMeta::new("created_at", FieldKind::Timestamp).json("createdAt"),
            FieldMeta::new("updated_at", FieldKind::Timestamp).json("updatedAt"),
            FieldMeta::new("name", FieldKind::Text),
            FieldMeta::new("parent_id", FieldKind::Integer)
                .json("parentId")
                .nullable(),
            FieldMeta::new("anonymous", FieldKind::Bool),
            FieldMeta::new("p1", FieldKind::Text),
            FieldMeta::new("p2", FieldKind::Text),
            FieldMeta::new("p3", FieldKind::Text),
        ],
    )
});

impl Model for Permission {
    fn meta() -> &'static EntityMeta {
        &PERMISSION_META
    }
}

impl Permission {
    /// Create a permission from its name, parent, anonymous flag, and
    /// ordered policy slots. Fails the caller's validation when more than
    /// [`MAX_POLICY_SLOTS`] slots are supplied.
    pub fn new(
        name: &str,
        parent_id: Option<PermissionId>,
        anonymous: bool,
        policies: &[&str],
    ) -> Option<Self> {
        if policies.len() > MAX_POLICY_SLOTS {
            return None;
        }
        let slot = |i: usize| policies.get(i).map(|s| s.to_string()).unwrap_or_default();
        let now = Utc::now();
        Some(Self {
            id: PermissionId::UNSET,
            created_at: now,
            updated_at: now,
            name: name.to_string(),
            parent_id,
            anonymous,
            p1: slot(0),
            p2: slot(1),
            p3: slot(2),
        })
    }

    /// The declared slots in positional order.
    pub fn policy_slots(&self) -> [&str; MAX_POLICY_SLOTS] {
        [&self.p1, &self.p2, &self.p3]
    }

    /// Whether this permission is a root (no parent) and therefore cascades
    /// to its children on delete.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Positional slot comparison against an action descriptor.
    ///
    /// Every supplied slot must equal the slot at the same position, and a
    /// descriptor supplying fewer slots than the permission declares only
    /// matches when the remaining declared slots are empty. Consequently an
    /// all-empty permission matches only the all-empty action; it is never
    /// a wildcard. The `anonymous` flag is deliberately not consulted here;
    /// the evaluator short-circuits on it before comparing slots.
    pub fn matches(&self, action: &Action) -> bool {
        let supplied = action.slots();
        if supplied.len() > MAX_POLICY_SLOTS {
            return false;
        }
        self.policy_slots()
            .iter()
            .enumerate()
            .all(|(i, declared)| supplied.get(i).map(String::as_str).unwrap_or("") == *declared)
    }
}
