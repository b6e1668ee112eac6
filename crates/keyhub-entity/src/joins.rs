//! Composite-keyed association records.
//!
//! These exist only as a unit with the association operation that creates
//! or destroys them; they are never edited independently. None declares a
//! single primary key, so the store treats their full column set as the
//! identity.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use keyhub_schema::{EntityMeta, FieldKind, FieldMeta, Model};

use crate::id::{GroupId, PermissionId, RoleId, UserId};

/// Principal-to-role association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    /// The principal side.
    pub user_id: UserId,
    /// The role side.
    pub role_id: RoleId,
}

static USER_ROLE_META: LazyLock<EntityMeta> = LazyLock::new(|| {
    EntityMeta::new(
        "user_roles",
        vec![
            FieldMeta::new("user_id", FieldKind::Integer).hidden(),
            FieldMeta::new("role_id", FieldKind::Integer).hidden(),
        ],
    )
});

impl Model for UserRole {
    fn meta() -> &'static EntityMeta {
        &USER_ROLE_META
    }
}

/// Principal-to-group association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// The principal side.
    pub user_id: UserId,
    /// The group side.
    pub group_id: GroupId,
}

static GROUP_MEMBER_META: LazyLock<EntityMeta> = LazyLock::new(|| {
    EntityMeta::new(
        "group_members",
        vec![
            FieldMeta::new("user_id", FieldKind::Integer).hidden(),
            FieldMeta::new("group_id", FieldKind::Integer).hidden(),
        ],
    )
});

impl Model for GroupMember {
    fn meta() -> &'static EntityMeta {
        &GROUP_MEMBER_META
    }
}

/// Role-to-permission association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    /// The role side.
    pub role_id: RoleId,
    /// The permission side.
    pub permission_id: PermissionId,
}

static ROLE_PERMISSION_META: LazyLock<EntityMeta> = LazyLock::new(|| {
    EntityMeta::new(
        "role_permissions",
        vec![
            FieldMeta::new("role_id", FieldKind::Integer).hidden(),
            FieldMeta::new("permission_id", FieldKind::Integer).hidden(),
        ],
    )
});

impl Model for RolePermission {
    fn meta() -> &'static EntityMeta {
        &ROLE_PERMISSION_META
    }
}
