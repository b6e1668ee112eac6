//! Role and permission maintenance.
//!
//! Every multi-record mutation goes through a single [`WriteBatch`] so a
//! role and its grants, or a permission and its children, change together
//! or not at all.

use chrono::Utc;
use serde_json::json;
use tracing::info;

use keyhub_core::{AppError, AppResult};
use keyhub_entity::{
    MAX_POLICY_SLOTS, Permission, PermissionId, Role, RoleId, RolePermission, UserRole,
};
use keyhub_schema::Model;
use keyhub_store::{Filter, RecordStore, Row, WriteBatch, typed};

use super::queries::get_permission_children;

/// Create a role and grant it the given permissions.
pub async fn add_role_with_permissions(
    store: &dyn RecordStore,
    role: &Role,
    permission_ids: &[PermissionId],
) -> AppResult<Role> {
    let role = typed::create(store, role).await?;
    if !permission_ids.is_empty() {
        store
            .apply_batch(grant_batch(WriteBatch::new(), role.id, permission_ids)?)
            .await?;
    }
    info!(role_id = role.id.value(), name = %role.name, grants = permission_ids.len(), "role created");
    Ok(role)
}

/// Rename or relabel a role and replace its entire grant set.
pub async fn update_role_with_permissions(
    store: &dyn RecordStore,
    role: &Role,
    permission_ids: &[PermissionId],
) -> AppResult<()> {
    if !role.id.is_set() {
        return Err(AppError::validation("role id required"));
    }
    let mut changes = Row::new();
    changes.insert("name".to_string(), json!(role.name));
    changes.insert("label".to_string(), json!(role.label));
    changes.insert("updated_at".to_string(), json!(Utc::now()));
    typed::update_fields::<Role>(store, role.id.value(), changes).await?;

    let batch = WriteBatch::new().delete(
        RolePermission::meta().table_name(),
        Filter::by("role_id", role.id.value()),
    );
    store
        .apply_batch(grant_batch(batch, role.id, permission_ids)?)
        .await?;
    info!(role_id = role.id.value(), name = %role.name, grants = permission_ids.len(), "role updated");
    Ok(())
}

/// Remove a role together with its grants and holder associations.
pub async fn delete_role(store: &dyn RecordStore, role_id: RoleId) -> AppResult<()> {
    let batch = WriteBatch::new()
        .delete(
            RolePermission::meta().table_name(),
            Filter::by("role_id", role_id.value()),
        )
        .delete(
            UserRole::meta().table_name(),
            Filter::by("role_id", role_id.value()),
        )
        .delete(
            Role::meta().table_name(),
            Filter::by(Role::meta().primary_key_column(), role_id.value()),
        );
    store.apply_batch(batch).await?;
    info!(role_id = role_id.value(), "role deleted");
    Ok(())
}

/// Create the permission, or update it when its key is already set.
pub async fn save_permission(
    store: &dyn RecordStore,
    permission: &Permission,
) -> AppResult<Permission> {
    if !permission.id.is_set() {
        let stored = typed::create(store, permission).await?;
        info!(permission_id = stored.id.value(), name = %stored.name, "permission created");
        return Ok(stored);
    }
    let mut changes = Row::new();
    changes.insert("name".to_string(), json!(permission.name));
    changes.insert(
        "parent_id".to_string(),
        json!(permission.parent_id.map(PermissionId::value)),
    );
    changes.insert("anonymous".to_string(), json!(permission.anonymous));
    changes.insert("p1".to_string(), json!(permission.p1));
    changes.insert("p2".to_string(), json!(permission.p2));
    changes.insert("p3".to_string(), json!(permission.p3));
    changes.insert("updated_at".to_string(), json!(Utc::now()));
    let touched = typed::update_fields::<Permission>(store, permission.id.value(), changes).await?;
    if touched == 0 {
        return Err(AppError::not_found("permission not exists"));
    }
    info!(permission_id = permission.id.value(), name = %permission.name, "permission updated");
    Ok(permission.clone())
}

/// Remove a permission. A root permission takes its direct children, and
/// every grant referencing any removed record, along with it.
pub async fn delete_permission(
    store: &dyn RecordStore,
    permission: &Permission,
) -> AppResult<()> {
    let grants = RolePermission::meta().table_name();
    let table = Permission::meta().table_name();
    let pk = Permission::meta().primary_key_column();

    let mut batch = WriteBatch::new();
    if permission.is_root() {
        for child in get_permission_children(store, permission.id).await? {
            batch = batch.delete(grants, Filter::by("permission_id", child.id.value()));
        }
        batch = batch.delete(table, Filter::by("parent_id", permission.id.value()));
    }
    batch = batch
        .delete(grants, Filter::by("permission_id", permission.id.value()))
        .delete(table, Filter::by(pk, permission.id.value()));
    store.apply_batch(batch).await?;
    info!(permission_id = permission.id.value(), name = %permission.name, "permission deleted");
    Ok(())
}

/// Validate a slot list before building a [`Permission`] from it.
pub fn check_policy_slots(policies: &[&str]) -> AppResult<()> {
    if policies.len() > MAX_POLICY_SLOTS {
        return Err(AppError::validation("too many policies"));
    }
    Ok(())
}

fn grant_batch(
    mut batch: WriteBatch,
    role_id: RoleId,
    permission_ids: &[PermissionId],
) -> AppResult<WriteBatch> {
    for &permission_id in permission_ids {
        let row = typed::to_row(&RolePermission {
            role_id,
            permission_id,
        })?;
        batch = batch.insert(RolePermission::meta().table_name(), row);
    }
    Ok(batch)
}
