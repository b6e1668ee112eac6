//! # keyhub-auth
//!
//! Authentication and authorization core for Keyhub: salted password
//! digests, the stateless self-verifying bearer token, request-scoped
//! identity resolution, and the RBAC model with its positional policy-slot
//! evaluator.
//!
//! ## Modules
//!
//! - `password` — salted SHA-256 digest creation and verification
//! - `token` — stateless bearer-token encode/decode (bit-exact wire format)
//! - `session` — the abstract session-state slot store
//! - `identity` — request context and principal resolution
//! - `users` — principal queries and mutations over the record store
//! - `groups` — organizational group queries
//! - `rbac` — permission evaluation, role/permission mutation, in-use checks

pub mod groups;
pub mod identity;
pub mod password;
pub mod rbac;
pub mod session;
pub mod token;
pub mod users;

pub use identity::RequestContext;
pub use password::PasswordHasher;
pub use session::{MemorySession, SessionState};
pub use token::TokenCodec;
