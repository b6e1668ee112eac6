//! # keyhub-service
//!
//! Request-level flows over the Keyhub engine: sign-in/sign-up/sign-out,
//! password changes, action authorization, role and permission
//! administration with in-use checks, and the persisted key/value settings
//! the policy switches live in.
//!
//! Each service owns an `Arc<dyn RecordStore>` and is cheap to clone; the
//! embedding HTTP layer constructs one per process and hands each request a
//! fresh [`keyhub_auth::RequestContext`].

pub mod auth;
pub mod rbac;
pub mod request;
pub mod settings;

pub use auth::{AuthService, SignUpOutcome};
pub use rbac::RbacAdminService;
pub use request::{ChangePasswordRequest, LoginRequest, PermissionRequest, RegisterRequest, RoleRequest};
pub use settings::Settings;
