//! Role, permission, and association queries.

use keyhub_core::AppResult;
use keyhub_entity::{
    Permission, PermissionId, Role, RoleId, RolePermission, User, UserId, UserRole,
};
use keyhub_schema::Model;
use keyhub_store::{Filter, RecordStore, WriteBatch, typed};

/// Load a role by key.
pub async fn get_role_by_id(store: &dyn RecordStore, id: RoleId) -> AppResult<Option<Role>> {
    typed::get_by_id(store, id.value()).await
}

/// Load a role by its unique name.
pub async fn get_role_by_name(store: &dyn RecordStore, name: &str) -> AppResult<Option<Role>> {
    typed::get_one(store, Filter::by("name", name)).await
}

/// Every role held by the principal.
pub async fn get_roles_by_user(store: &dyn RecordStore, user_id: UserId) -> AppResult<Vec<Role>> {
    let held: Vec<UserRole> = typed::get_all(store, Filter::by("user_id", user_id.value())).await?;
    let mut roles = Vec::with_capacity(held.len());
    for user_role in held {
        if let Some(role) = get_role_by_id(store, user_role.role_id).await? {
            roles.push(role);
        }
    }
    Ok(roles)
}

/// Every principal holding the role.
pub async fn get_users_by_role(store: &dyn RecordStore, role_id: RoleId) -> AppResult<Vec<User>> {
    let held: Vec<UserRole> = typed::get_all(store, Filter::by("role_id", role_id.value())).await?;
    let mut users = Vec::with_capacity(held.len());
    for user_role in held {
        if let Some(user) = crate::users::get_user_by_id(store, user_role.user_id).await? {
            users.push(user);
        }
    }
    Ok(users)
}

/// Whether any principal still holds the role.
pub async fn check_role_in_use(store: &dyn RecordStore, role_id: RoleId) -> AppResult<bool> {
    let count = typed::count::<UserRole>(store, Filter::by("role_id", role_id.value())).await?;
    Ok(count > 0)
}

/// Whether a role with this name already exists.
pub async fn check_role_name_exist(store: &dyn RecordStore, name: &str) -> AppResult<bool> {
    let count = typed::count::<Role>(store, Filter::by("name", name)).await?;
    Ok(count > 0)
}

/// Load a permission by key.
pub async fn get_permission_by_id(
    store: &dyn RecordStore,
    id: PermissionId,
) -> AppResult<Option<Permission>> {
    typed::get_by_id(store, id.value()).await
}

/// Load a permission by its unique name.
pub async fn get_permission_by_name(
    store: &dyn RecordStore,
    name: &str,
) -> AppResult<Option<Permission>> {
    typed::get_one(store, Filter::by("name", name)).await
}

/// Every permission granted through the role.
pub async fn get_permissions_by_role(
    store: &dyn RecordStore,
    role_id: RoleId,
) -> AppResult<Vec<Permission>> {
    let granted: Vec<RolePermission> =
        typed::get_all(store, Filter::by("role_id", role_id.value())).await?;
    let mut permissions = Vec::with_capacity(granted.len());
    for role_permission in granted {
        if let Some(permission) =
            get_permission_by_id(store, role_permission.permission_id).await?
        {
            permissions.push(permission);
        }
    }
    Ok(permissions)
}

/// Direct children of a permission (the hierarchy is one level deep).
pub async fn get_permission_children(
    store: &dyn RecordStore,
    permission_id: PermissionId,
) -> AppResult<Vec<Permission>> {
    typed::get_all(store, Filter::by("parent_id", permission_id.value())).await
}

/// Whether any role still grants the permission.
pub async fn check_permission_in_use(
    store: &dyn RecordStore,
    permission_id: PermissionId,
) -> AppResult<bool> {
    let count =
        typed::count::<RolePermission>(store, Filter::by("permission_id", permission_id.value()))
            .await?;
    Ok(count > 0)
}

/// Whether a permission with this name already exists.
pub async fn check_permission_name_exist(store: &dyn RecordStore, name: &str) -> AppResult<bool> {
    let count = typed::count::<Permission>(store, Filter::by("name", name)).await?;
    Ok(count > 0)
}

/// Grant one more role to a principal.
pub async fn add_role_for_user(
    store: &dyn RecordStore,
    user_id: UserId,
    role_id: RoleId,
) -> AppResult<()> {
    let user_role = UserRole { user_id, role_id };
    typed::create(store, &user_role).await?;
    Ok(())
}

/// Replace the principal's entire role set in one atomic unit.
pub async fn update_roles_for_user(
    store: &dyn RecordStore,
    user_id: UserId,
    role_ids: &[RoleId],
) -> AppResult<()> {
    let table = UserRole::meta().table_name();
    let mut batch = WriteBatch::new().delete(table, Filter::by("user_id", user_id.value()));
    for &role_id in role_ids {
        let row = typed::to_row(&UserRole { user_id, role_id })?;
        batch = batch.insert(table, row);
    }
    store.apply_batch(batch).await
}
