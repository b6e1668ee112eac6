//! Generic entity edit guard.
//!
//! Partial-update endpoints accept arbitrary JSON bodies; this guard is the
//! only path from such a body to a storage write. It maps wire names to
//! declared fields, type-checks every supplied value, and intersects the
//! result with an explicit allow-list so a caller can never reach internal
//! fields (superuser flags, digests) by naming them in the payload.

use serde_json::{Map, Value};

use keyhub_core::{AppError, AppResult};

use crate::meta::Model;

/// Validate a partial-update payload for `T` and reduce it to a map of
/// storage columns to values, ready for a field-level update.
///
/// Rules, in order:
/// - the payload must be a JSON object;
/// - the primary-key field and any key not declared on `T` are silently
///   dropped;
/// - `null` is kept only for nullable fields, silently dropped otherwise;
/// - a value whose JSON kind is incompatible with the declared field kind
///   fails with a validation error naming the field;
/// - the surviving set is intersected with `editable` (Rust field names);
///   an empty allow-list therefore means nothing is editable;
/// - an empty final set fails with "nothing to update".
pub fn apply_edit<T: Model>(payload: &Value, editable: &[&str]) -> AppResult<Map<String, Value>> {
    let object = payload
        .as_object()
        .ok_or_else(|| AppError::validation("payload must be a JSON object"))?;

    let meta = T::meta();
    let pk_json = meta.primary_key_json();

    let mut vals: Map<String, Value> = Map::new();
    for (key, value) in object {
        // The primary key is never editable.
        if pk_json == Some(key.as_str()) {
            continue;
        }
        let Some(field) = meta.field_for_json_name(key) else {
            continue;
        };
        if value.is_null() {
            if field.nullable {
                vals.insert(field.column.clone(), Value::Null);
            }
            continue;
        }
        if !field.kind.accepts(value) {
            return Err(AppError::validation(format!(
                "{} type not match",
                field.name
            )));
        }
        vals.insert(field.column.clone(), value.clone());
    }

    let allowed: Map<String, Value> = editable
        .iter()
        .filter_map(|name| meta.column_for_field(name))
        .filter_map(|column| vals.remove(column).map(|v| (column.to_string(), v)))
        .collect();

    if allowed.is_empty() {
        return Err(AppError::validation("nothing to update"));
    }

    Ok(allowed)
}
