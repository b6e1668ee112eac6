//! Abstract session state.
//!
//! Cookie codecs and session stores are the embedder's concern; the engine
//! only needs named string slots it can read, write, and clear. The slot
//! keys are namespaced so they coexist with whatever else the embedder
//! keeps in the session.

use std::collections::HashMap;

/// Session slot holding the signed-in principal's id.
pub const USER_KEY: &str = "_keyhub_uid";
/// Session slot holding the switched-to group's id.
pub const GROUP_KEY: &str = "_keyhub_gid";
/// Session slot holding the preferred IANA timezone name.
pub const TZ_KEY: &str = "_keyhub_tz";

/// String-slot view of one caller's session.
pub trait SessionState: Send + Sync {
    /// Read a slot.
    fn get(&self, key: &str) -> Option<String>;
    /// Write a slot.
    fn set(&mut self, key: &str, value: &str);
    /// Clear a slot.
    fn remove(&mut self, key: &str);
}

/// In-memory session, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    slots: HashMap<String, String>,
}

impl MemorySession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionState for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.slots.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.slots.remove(key);
    }
}
