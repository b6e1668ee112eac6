//! Organizational group queries and membership.
//!
//! Groups scope principals for the embedder; the permission evaluator
//! never consults them.

use keyhub_core::AppResult;
use keyhub_entity::{Group, GroupId, GroupMember, User, UserId};
use keyhub_store::{Filter, RecordStore, typed};

/// Load a group by key.
pub async fn get_group_by_id(store: &dyn RecordStore, id: GroupId) -> AppResult<Option<Group>> {
    typed::get_by_id(store, id.value()).await
}

/// Load a group by its unique name.
pub async fn get_group_by_name(store: &dyn RecordStore, name: &str) -> AppResult<Option<Group>> {
    typed::get_one(store, Filter::by("name", name)).await
}

/// Every group the principal belongs to.
pub async fn get_groups_by_user(store: &dyn RecordStore, user_id: UserId) -> AppResult<Vec<Group>> {
    let members: Vec<GroupMember> =
        typed::get_all(store, Filter::by("user_id", user_id.value())).await?;
    let mut groups = Vec::with_capacity(members.len());
    for member in members {
        if let Some(group) = get_group_by_id(store, member.group_id).await? {
            groups.push(group);
        }
    }
    Ok(groups)
}

/// The principal's first group membership, if any.
pub async fn get_first_group_by_user(
    store: &dyn RecordStore,
    user_id: UserId,
) -> AppResult<Option<Group>> {
    let member: Option<GroupMember> =
        typed::get_one(store, Filter::by("user_id", user_id.value())).await?;
    match member {
        Some(member) => get_group_by_id(store, member.group_id).await,
        None => Ok(None),
    }
}

/// Create a group with the principal as its first member.
pub async fn create_group_by_user(
    store: &dyn RecordStore,
    user_id: UserId,
    name: &str,
) -> AppResult<Group> {
    let group = typed::create(store, &Group::new(name)).await?;
    let member = GroupMember {
        user_id,
        group_id: group.id,
    };
    typed::create(store, &member).await?;
    Ok(group)
}

/// Every principal in the group.
pub async fn get_users_by_group(store: &dyn RecordStore, group_id: GroupId) -> AppResult<Vec<User>> {
    let members: Vec<GroupMember> =
        typed::get_all(store, Filter::by("group_id", group_id.value())).await?;
    let mut users = Vec::with_capacity(members.len());
    for member in members {
        if let Some(user) = crate::users::get_user_by_id(store, member.user_id).await? {
            users.push(user);
        }
    }
    Ok(users)
}

/// Whether any membership still references the group.
pub async fn check_group_in_use(store: &dyn RecordStore, group_id: GroupId) -> AppResult<bool> {
    let count =
        typed::count::<GroupMember>(store, Filter::by("group_id", group_id.value())).await?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyhub_store::MemoryStore;

    use crate::password::PasswordHasher;
    use crate::users::create_user;

    async fn seeded_user(store: &MemoryStore, email: &str) -> User {
        create_user(store, &PasswordHasher::new("s"), email, "pw")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_group_with_first_member() {
        let store = MemoryStore::new();
        let user = seeded_user(&store, "a@b.c").await;

        let group = create_group_by_user(&store, user.id, "staff").await.unwrap();
        assert!(group.id.is_set());

        let first = get_first_group_by_user(&store, user.id).await.unwrap();
        assert_eq!(first.unwrap().id, group.id);
        assert!(check_group_in_use(&store, group.id).await.unwrap());

        let members = get_users_by_group(&store, group.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, user.id);
    }

    #[tokio::test]
    async fn test_lookup_by_name_and_membership_list() {
        let store = MemoryStore::new();
        let user = seeded_user(&store, "a@b.c").await;
        create_group_by_user(&store, user.id, "staff").await.unwrap();
        create_group_by_user(&store, user.id, "ops").await.unwrap();

        let found = get_group_by_name(&store, "ops").await.unwrap().unwrap();
        assert_eq!(found.name, "ops");
        assert!(get_group_by_name(&store, "nope").await.unwrap().is_none());

        let groups = get_groups_by_user(&store, user.id).await.unwrap();
        assert_eq!(groups.len(), 2);

        let empty = get_groups_by_user(&store, UserId::from(999)).await.unwrap();
        assert!(empty.is_empty());
        assert!(!check_group_in_use(&store, GroupId::from(999)).await.unwrap());
    }
}
