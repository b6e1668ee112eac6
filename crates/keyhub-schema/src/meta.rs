//! Per-type entity metadata tables and the resolver lookups over them.
//!
//! The original reflection-driven mapping is replaced by explicit per-field
//! declarations assembled into an [`EntityMeta`] once per type (typically
//! inside a `LazyLock` static). Lookups are pure functions over the built
//! table; an unknown field or wire name yields `None`, never a panic.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::kind::FieldKind;

/// Declaration of a single stored field.
#[derive(Debug, Clone)]
pub struct FieldMeta {
    /// Rust field name. Doubles as the storage column unless overridden.
    pub name: &'static str,
    /// Storage column name.
    pub column: String,
    /// JSON wire name, `None` for fields hidden from the wire.
    pub json_name: Option<&'static str>,
    /// Declared value kind.
    pub kind: FieldKind,
    /// Whether the field tolerates an explicit JSON `null`.
    pub nullable: bool,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether the field is written to storage at all. Ephemeral fields
    /// (like the bearer token echoed back on login) exist only on the
    /// in-memory value.
    pub persisted: bool,
}

impl FieldMeta {
    /// Declare a field. The column defaults to the snake_case fold of the
    /// name and the wire name defaults to the name itself.
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column: snake_case(name),
            json_name: Some(name),
            kind,
            nullable: false,
            primary_key: false,
            persisted: true,
        }
    }

    /// Override the storage column.
    pub fn column(mut self, column: &str) -> Self {
        self.column = column.to_string();
        self
    }

    /// Override the JSON wire name (e.g. camelCase).
    pub fn json(mut self, json_name: &'static str) -> Self {
        self.json_name = Some(json_name);
        self
    }

    /// Hide the field from the wire entirely.
    pub fn hidden(mut self) -> Self {
        self.json_name = None;
        self
    }

    /// Mark the field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark the field as accepting `null`.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark the field as never persisted.
    pub fn ephemeral(mut self) -> Self {
        self.persisted = false;
        self
    }
}

/// Metadata table for one record type: its storage table, fields, and the
/// lookup indexes the resolver functions answer from.
#[derive(Debug)]
pub struct EntityMeta {
    table: &'static str,
    fields: Vec<FieldMeta>,
    by_name: HashMap<&'static str, usize>,
    by_json: HashMap<&'static str, usize>,
    pk: Option<usize>,
}

impl EntityMeta {
    /// Build the table and its indexes. Done once per type.
    pub fn new(table: &'static str, fields: Vec<FieldMeta>) -> Self {
        let mut by_name = HashMap::with_capacity(fields.len());
        let mut by_json = HashMap::with_capacity(fields.len());
        let mut pk = None;
        for (i, field) in fields.iter().enumerate() {
            by_name.insert(field.name, i);
            if let Some(json_name) = field.json_name {
                by_json.insert(json_name, i);
            }
            if field.primary_key && pk.is_none() {
                pk = Some(i);
            }
        }
        Self {
            table,
            fields,
            by_name,
            by_json,
            pk,
        }
    }

    /// The storage table name.
    pub fn table_name(&self) -> &'static str {
        self.table
    }

    /// The primary-key column, falling back to `"id"` when no field is
    /// flagged as the key.
    pub fn primary_key_column(&self) -> &str {
        match self.pk {
            Some(i) => &self.fields[i].column,
            None => "id",
        }
    }

    /// The primary key's wire name, falling back to its field name when the
    /// key is hidden from the wire.
    pub fn primary_key_json(&self) -> Option<&'static str> {
        let i = self.pk?;
        Some(self.fields[i].json_name.unwrap_or(self.fields[i].name))
    }

    /// All declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// Look up a field by its Rust name.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// The storage column for a field, `None` when the field is unknown.
    pub fn column_for_field(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.column.as_str())
    }

    /// Resolve a JSON wire name to its field declaration.
    pub fn field_for_json_name(&self, json_name: &str) -> Option<&FieldMeta> {
        self.by_json.get(json_name).map(|&i| &self.fields[i])
    }
}

/// A record type with declared metadata and a serde representation whose
/// keys are the storage columns.
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The static metadata table for this type.
    fn meta() -> &'static EntityMeta;
}

/// Deterministic name fold used when no explicit column is declared:
/// lowercase with underscore separation.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
