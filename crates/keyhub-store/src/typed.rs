//! Typed helpers over the row-level store.
//!
//! These drive [`RecordStore`] from each model's declared metadata, giving
//! the rest of the engine a generic get-by-key / get-by-example / count /
//! create / update / delete surface without per-entity repositories.

use serde_json::Value;

use keyhub_core::{AppError, AppResult};
use keyhub_schema::Model;

use crate::store::{Filter, RecordStore, Row};

/// Serialize a model into its storage row, stripping never-persisted
/// columns.
pub fn to_row<T: Model>(value: &T) -> AppResult<Row> {
    let serialized = serde_json::to_value(value)?;
    let Value::Object(mut row) = serialized else {
        return Err(AppError::internal(format!(
            "model for table {} did not serialize to an object",
            T::meta().table_name()
        )));
    };
    for field in T::meta().fields() {
        if !field.persisted {
            row.remove(&field.column);
        }
    }
    Ok(row)
}

/// Deserialize a storage row back into its model.
pub fn from_row<T: Model>(row: Row) -> AppResult<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Fetch one record by primary key.
pub async fn get_by_id<T: Model>(store: &dyn RecordStore, id: i64) -> AppResult<Option<T>> {
    let meta = T::meta();
    let filter = Filter::by(meta.primary_key_column(), id);
    get_one(store, filter).await
}

/// Fetch the first record matching a query-by-example filter.
pub async fn get_one<T: Model>(store: &dyn RecordStore, filter: Filter) -> AppResult<Option<T>> {
    let row = store.find_row(T::meta().table_name(), &filter).await?;
    row.map(from_row).transpose()
}

/// Fetch every record matching the filter.
pub async fn get_all<T: Model>(store: &dyn RecordStore, filter: Filter) -> AppResult<Vec<T>> {
    let rows = store.find_rows(T::meta().table_name(), &filter).await?;
    rows.into_iter().map(from_row).collect()
}

/// Count records matching the filter.
pub async fn count<T: Model>(store: &dyn RecordStore, filter: Filter) -> AppResult<u64> {
    store.count(T::meta().table_name(), &filter).await
}

/// Insert a record, letting the store assign the primary key when the
/// model declares one. Returns the stored record (with its key).
pub async fn create<T: Model>(store: &dyn RecordStore, value: &T) -> AppResult<T> {
    let meta = T::meta();
    let row = to_row(value)?;
    let auto_key = meta
        .fields()
        .iter()
        .any(|f| f.primary_key)
        .then(|| meta.primary_key_column());
    let stored = store.insert_row(meta.table_name(), row, auto_key).await?;
    from_row(stored)
}

/// Set the given columns on the record with this primary key. The primary
/// key itself and never-persisted columns are refused.
pub async fn update_fields<T: Model>(
    store: &dyn RecordStore,
    id: i64,
    mut changes: Row,
) -> AppResult<u64> {
    let meta = T::meta();
    changes.remove(meta.primary_key_column());
    for field in meta.fields() {
        if !field.persisted {
            changes.remove(&field.column);
        }
    }
    if changes.is_empty() {
        return Ok(0);
    }
    let filter = Filter::by(meta.primary_key_column(), id);
    store.update_rows(meta.table_name(), &filter, changes).await
}

/// Delete every record matching the filter.
pub async fn delete_where<T: Model>(store: &dyn RecordStore, filter: Filter) -> AppResult<u64> {
    store.delete_rows(T::meta().table_name(), &filter).await
}

/// Delete the record with this primary key.
pub async fn delete_by_id<T: Model>(store: &dyn RecordStore, id: i64) -> AppResult<u64> {
    let filter = Filter::by(T::meta().primary_key_column(), id);
    delete_where::<T>(store, filter).await
}
