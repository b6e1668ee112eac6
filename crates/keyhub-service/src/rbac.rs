//! Role and permission administration with boundary in-use checks.
//!
//! The mutation primitives in `keyhub_auth::rbac` will happily cascade;
//! this service is the API boundary that blocks instead, refusing to
//! delete anything still referenced.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};

use keyhub_auth::rbac::queries::{
    check_permission_in_use, check_permission_name_exist, check_role_in_use,
    check_role_name_exist, get_permission_by_id, get_permission_children, get_role_by_id,
};
use keyhub_auth::rbac::{self, check_policy_slots};
use keyhub_core::{AppError, AppResult};
use keyhub_entity::{Permission, PermissionId, Role, RoleId};
use keyhub_schema::guard::apply_edit;
use keyhub_store::{RecordStore, typed};

use crate::request::{PermissionRequest, RoleRequest, validate};

/// Fields a partial permission edit may touch.
const PERMISSION_EDITABLE: &[&str] = &["name", "anonymous", "p1", "p2", "p3"];

/// Role and permission management flows.
#[derive(Clone)]
pub struct RbacAdminService {
    store: Arc<dyn RecordStore>,
}

impl RbacAdminService {
    /// Administration over the given store.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Create a role with its grant set.
    pub async fn create_role(&self, req: &RoleRequest) -> AppResult<Role> {
        validate(req)?;
        let store = self.store.as_ref();
        if check_role_name_exist(store, &req.name).await? {
            return Err(AppError::conflict("role name exists"));
        }
        rbac::add_role_with_permissions(store, &Role::new(&req.name, &req.label), &req.permission_ids)
            .await
    }

    /// Rename or relabel a role and replace its grant set.
    pub async fn update_role(&self, req: &RoleRequest) -> AppResult<Role> {
        validate(req)?;
        let store = self.store.as_ref();
        let mut role = get_role_by_id(store, req.id)
            .await?
            .ok_or_else(|| AppError::not_found("role not exists"))?;
        if let Some(other) = rbac::queries::get_role_by_name(store, &req.name).await?
            && other.id != role.id
        {
            return Err(AppError::conflict("role name exists"));
        }
        role.name.clone_from(&req.name);
        role.label.clone_from(&req.label);
        rbac::update_role_with_permissions(store, &role, &req.permission_ids).await?;
        Ok(role)
    }

    /// Delete a role, refusing while any principal still holds it.
    pub async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let store = self.store.as_ref();
        if check_role_in_use(store, role_id).await? {
            return Err(AppError::conflict("role in use"));
        }
        rbac::delete_role(store, role_id).await
    }

    /// Create a permission, or update it when the request carries a key.
    pub async fn save_permission(&self, req: &PermissionRequest) -> AppResult<Permission> {
        validate(req)?;
        let slots: Vec<&str> = req.policies.iter().map(String::as_str).collect();
        check_policy_slots(&slots)?;
        let store = self.store.as_ref();

        if !req.id.is_set() {
            if check_permission_name_exist(store, &req.name).await? {
                return Err(AppError::conflict("permission name exists"));
            }
            let permission = Permission::new(&req.name, req.parent_id, req.anonymous, &slots)
                .ok_or_else(|| AppError::validation("too many policies"))?;
            return rbac::save_permission(store, &permission).await;
        }

        let mut permission = get_permission_by_id(store, req.id)
            .await?
            .ok_or_else(|| AppError::not_found("permission not exists"))?;
        permission.name.clone_from(&req.name);
        permission.parent_id = req.parent_id;
        permission.anonymous = req.anonymous;
        permission.p1 = slots.first().unwrap_or(&"").to_string();
        permission.p2 = slots.get(1).unwrap_or(&"").to_string();
        permission.p3 = slots.get(2).unwrap_or(&"").to_string();
        rbac::save_permission(store, &permission).await
    }

    /// Partially edit a permission from a raw JSON payload. Only the
    /// allow-listed fields can change; the payload is type-checked against
    /// the declared field kinds.
    pub async fn edit_permission(
        &self,
        permission_id: PermissionId,
        payload: &Value,
    ) -> AppResult<()> {
        let mut changes = apply_edit::<Permission>(payload, PERMISSION_EDITABLE)?;
        changes.insert("updated_at".to_string(), json!(Utc::now()));
        let touched =
            typed::update_fields::<Permission>(self.store.as_ref(), permission_id.value(), changes)
                .await?;
        if touched == 0 {
            return Err(AppError::not_found("permission not exists"));
        }
        Ok(())
    }

    /// Delete a permission, refusing while it (or, for a root, any of its
    /// children) is still granted to a role.
    pub async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        let store = self.store.as_ref();
        let permission = get_permission_by_id(store, permission_id)
            .await?
            .ok_or_else(|| AppError::not_found("permission not exists"))?;
        if check_permission_in_use(store, permission.id).await? {
            return Err(AppError::conflict("permission in use"));
        }
        if permission.is_root() {
            for child in get_permission_children(store, permission.id).await? {
                if check_permission_in_use(store, child.id).await? {
                    return Err(AppError::conflict("permission in use"));
                }
            }
        }
        rbac::delete_permission(store, &permission).await
    }
}
