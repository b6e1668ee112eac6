//! # keyhub-store
//!
//! The Record Store Adapter boundary. The engine talks to storage only
//! through the [`RecordStore`] trait — row-level find/count/insert/update/
//! delete over JSON rows plus an atomic [`WriteBatch`] — and through the
//! typed helpers in [`typed`], which drive the trait from each model's
//! declared metadata. [`MemoryStore`] is the bundled single-node
//! implementation used for embedding and tests; a relational adapter lives
//! with the embedder.

pub mod memory;
pub mod store;
pub mod typed;

pub use memory::MemoryStore;
pub use store::{Filter, RecordStore, Row, WriteBatch, WriteOp};
