//! Role-based access control: the permission evaluator, the role and
//! permission mutation operations, and the association queries they rest
//! on.
//!
//! In-use checks are exposed as separate queries rather than enforced by
//! the mutations themselves, so an API boundary can choose to block or to
//! cascade.

pub mod admin;
pub mod evaluator;
pub mod queries;

pub use admin::{
    add_role_with_permissions, check_policy_slots, delete_permission, delete_role,
    save_permission, update_role_with_permissions,
};
pub use evaluator::{check_role_permission, check_user_permission};
