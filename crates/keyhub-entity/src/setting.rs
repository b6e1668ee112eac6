//! Persisted key/value settings row.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use keyhub_schema::{EntityMeta, FieldKind, FieldMeta, Model};

/// A process-wide named setting stored in the record store.
///
/// Keys are uppercased before every read or write, and at most one row may
/// exist per normalized key; the `Settings` service enforces both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    /// Primary key, assigned by the store.
    #[serde(default)]
    pub id: i64,
    /// Uppercased setting key.
    pub key: String,
    /// String value; booleans and integers are parsed out of it.
    pub value: String,
    /// Human-readable description.
    #[serde(default)]
    pub desc: String,
}

static SETTING_META: LazyLock<EntityMeta> = LazyLock::new(|| {
    EntityMeta::new(
        "settings",
        vec![
            FieldMeta::new("id", FieldKind::Integer).primary_key(),
            FieldMeta::new("key", FieldKind::Text),
            FieldMeta::new("value", FieldKind::Text),
            FieldMeta::new("desc", FieldKind::Text),
        ],
    )
});

impl Model for Setting {
    fn meta() -> &'static EntityMeta {
        &SETTING_META
    }
}
