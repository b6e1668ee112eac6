//! # keyhub-core
//!
//! Core crate for the Keyhub authentication/authorization engine. Contains
//! configuration schemas, domain events with the injected sink trait, and
//! the unified error system.
//!
//! This crate has **no** internal dependencies on other Keyhub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;

pub use config::AuthConfig;
pub use error::{AppError, ErrorKind};
pub use events::{AuthEvent, EventSink, NullSink};
pub use result::AppResult;
