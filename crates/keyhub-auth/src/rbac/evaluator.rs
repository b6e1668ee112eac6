//! Access decisions.
//!
//! A principal may perform an action when any permission granted through
//! any of their roles covers it. Grants are purely additive: there is no
//! deny rule, so the first covering permission settles the question.

use keyhub_core::AppResult;
use keyhub_entity::{Action, RoleId, UserId};
use keyhub_store::RecordStore;
use tracing::debug;

use super::queries::{get_permissions_by_role, get_roles_by_user};

/// Whether the role grants the action.
///
/// An `anonymous` permission covers every action. All other permissions
/// are compared slot by slot against the supplied action.
pub async fn check_role_permission(
    store: &dyn RecordStore,
    role_id: RoleId,
    action: &Action,
) -> AppResult<bool> {
    let permissions = get_permissions_by_role(store, role_id).await?;
    for permission in permissions {
        if permission.anonymous || permission.matches(action) {
            debug!(
                role_id = role_id.value(),
                permission = %permission.name,
                "permission granted"
            );
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether any of the principal's roles grants the action.
pub async fn check_user_permission(
    store: &dyn RecordStore,
    user_id: UserId,
    action: &Action,
) -> AppResult<bool> {
    let roles = get_roles_by_user(store, user_id).await?;
    for role in roles {
        if check_role_permission(store, role.id, action).await? {
            return Ok(true);
        }
    }
    Ok(false)
}
