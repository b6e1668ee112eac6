//! # keyhub-schema
//!
//! Metadata-driven entity access for Keyhub. Every record type declares a
//! static [`EntityMeta`] table (field names, storage columns, JSON wire
//! names, value kinds, the primary key); the resolver functions are pure
//! lookups over that table, built once per type. On top of it sits the
//! generic edit guard that validates partial-update payloads against an
//! explicit allow-list.

pub mod guard;
pub mod kind;
pub mod meta;

pub use guard::apply_edit;
pub use kind::FieldKind;
pub use meta::{EntityMeta, FieldMeta, Model};
