//! # keyhub-entity
//!
//! Record models for the Keyhub engine: principals, groups, roles,
//! permissions, their join entities, and the persisted settings row. Each
//! model declares its [`keyhub_schema::EntityMeta`] table; the serde
//! representation of every model uses storage column names, so a serialized
//! model *is* its storage row.

pub mod group;
pub mod id;
pub mod joins;
pub mod permission;
pub mod role;
pub mod setting;
pub mod user;

pub use group::Group;
pub use id::{GroupId, PermissionId, RoleId, UserId};
pub use joins::{GroupMember, RolePermission, UserRole};
pub use permission::{Action, MAX_POLICY_SLOTS, Permission};
pub use role::Role;
pub use setting::Setting;
pub use user::{Profile, User};
