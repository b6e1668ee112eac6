//! In-memory record store using a Tokio mutex for single-node use.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use keyhub_core::AppResult;

use crate::store::{Filter, RecordStore, Row, WriteBatch, WriteOp};

/// One stored table: its rows and the key sequence.
#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    sequence: i64,
}

impl Table {
    fn apply_update(&mut self, filter: &Filter, changes: &Row) -> u64 {
        let mut touched = 0;
        for row in self.rows.iter_mut().filter(|r| filter.matches(r)) {
            for (column, value) in changes {
                row.insert(column.clone(), value.clone());
            }
            touched += 1;
        }
        touched
    }

    fn apply_delete(&mut self, filter: &Filter) -> u64 {
        let before = self.rows.len();
        self.rows.retain(|row| !filter.matches(row));
        (before - self.rows.len()) as u64
    }
}

/// In-memory [`RecordStore`] backed by a table map under one Tokio mutex.
///
/// Suitable for embedding, demos, and tests. Batches are trivially atomic:
/// every operation in a batch runs under the same lock acquisition and none
/// of the in-memory operations can fail partway.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, Table>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Whether the auto-key column still needs a value.
fn needs_key(row: &Row, auto_key: &str) -> bool {
    match row.get(auto_key) {
        None | Some(Value::Null) => true,
        Some(value) => value.as_i64() == Some(0),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_row(&self, table: &str, filter: &Filter) -> AppResult<Option<Row>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .get(table)
            .and_then(|t| t.rows.iter().find(|row| filter.matches(row)).cloned()))
    }

    async fn find_rows(&self, table: &str, filter: &Filter) -> AppResult<Vec<Row>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .get(table)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|row| filter.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, table: &str, filter: &Filter) -> AppResult<u64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .get(table)
            .map(|t| t.rows.iter().filter(|row| filter.matches(row)).count() as u64)
            .unwrap_or(0))
    }

    async fn insert_row(&self, table: &str, mut row: Row, auto_key: Option<&str>) -> AppResult<Row> {
        let mut tables = self.tables.lock().await;
        let table = tables.entry(table.to_string()).or_default();
        if let Some(key) = auto_key {
            if needs_key(&row, key) {
                table.sequence += 1;
                row.insert(key.to_string(), Value::from(table.sequence));
            } else if let Some(assigned) = row.get(key).and_then(Value::as_i64) {
                // Keep the sequence ahead of explicitly keyed inserts.
                table.sequence = table.sequence.max(assigned);
            }
        }
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update_rows(&self, table: &str, filter: &Filter, changes: Row) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .get_mut(table)
            .map(|t| t.apply_update(filter, &changes))
            .unwrap_or(0))
    }

    async fn delete_rows(&self, table: &str, filter: &Filter) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .get_mut(table)
            .map(|t| t.apply_delete(filter))
            .unwrap_or(0))
    }

    async fn apply_batch(&self, batch: WriteBatch) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        for op in batch.ops() {
            match op {
                WriteOp::Insert { table, row } => {
                    tables
                        .entry(table.clone())
                        .or_default()
                        .rows
                        .push(row.clone());
                }
                WriteOp::Update {
                    table,
                    filter,
                    changes,
                } => {
                    if let Some(t) = tables.get_mut(table) {
                        t.apply_update(filter, changes);
                    }
                }
                WriteOp::Delete { table, filter } => {
                    if let Some(t) = tables.get_mut(table) {
                        t.apply_delete(filter);
                    }
                }
            }
        }
        Ok(())
    }
}
