//! The record store trait, query-by-example filters, and atomic batches.

use async_trait::async_trait;
use serde_json::Value;

use keyhub_core::AppResult;

/// A storage row: a JSON object whose keys are storage column names.
pub type Row = serde_json::Map<String, Value>;

/// A conjunctive query-by-example filter: every `(column, value)` pair must
/// match for a row to qualify. An empty filter matches every row.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// An empty filter (matches all rows).
    pub fn all() -> Self {
        Self::default()
    }

    /// Start a filter from one equality condition.
    pub fn by(column: &str, value: impl Into<Value>) -> Self {
        Self::all().and(column, value)
    }

    /// Add another equality condition.
    pub fn and(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((column.to_string(), value.into()));
        self
    }

    /// The `(column, value)` pairs, in insertion order.
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Whether a row satisfies every condition. An absent column is
    /// treated as `null`.
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions
            .iter()
            .all(|(column, value)| row.get(column).unwrap_or(&Value::Null) == value)
    }
}

/// One write in an atomic batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert a fully formed row (no key assignment).
    Insert {
        /// Target table.
        table: String,
        /// The row to insert.
        row: Row,
    },
    /// Set columns on every matching row.
    Update {
        /// Target table.
        table: String,
        /// Which rows to touch.
        filter: Filter,
        /// Columns to set.
        changes: Row,
    },
    /// Delete every matching row.
    Delete {
        /// Target table.
        table: String,
        /// Which rows to remove.
        filter: Filter,
    },
}

/// An ordered group of writes applied as one logical unit.
///
/// The cascade deletes and association replacements of the RBAC model go
/// through batches so a failure partway never leaves a role or permission
/// referencing a deleted counterpart.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an insert.
    pub fn insert(mut self, table: &str, row: Row) -> Self {
        self.ops.push(WriteOp::Insert {
            table: table.to_string(),
            row,
        });
        self
    }

    /// Queue an update.
    pub fn update(mut self, table: &str, filter: Filter, changes: Row) -> Self {
        self.ops.push(WriteOp::Update {
            table: table.to_string(),
            filter,
            changes,
        });
        self
    }

    /// Queue a delete.
    pub fn delete(mut self, table: &str, filter: Filter) -> Self {
        self.ops.push(WriteOp::Delete {
            table: table.to_string(),
            filter,
        });
        self
    }

    /// The queued operations, in order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// The storage boundary of the engine.
///
/// Implementations are shared across concurrent requests and must be safe
/// for that use. Every call blocks the request's control flow; the engine
/// never retries a failed store call.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the first row matching the filter.
    async fn find_row(&self, table: &str, filter: &Filter) -> AppResult<Option<Row>>;

    /// Find every row matching the filter.
    async fn find_rows(&self, table: &str, filter: &Filter) -> AppResult<Vec<Row>>;

    /// Count rows matching the filter.
    async fn count(&self, table: &str, filter: &Filter) -> AppResult<u64>;

    /// Insert a row, assigning the next sequence value to `auto_key` when
    /// that column is absent, null, or zero. Returns the stored row.
    async fn insert_row(&self, table: &str, row: Row, auto_key: Option<&str>) -> AppResult<Row>;

    /// Set columns on every matching row. Returns the number touched.
    async fn update_rows(&self, table: &str, filter: &Filter, changes: Row) -> AppResult<u64>;

    /// Delete every matching row. Returns the number removed.
    async fn delete_rows(&self, table: &str, filter: &Filter) -> AppResult<u64>;

    /// Apply a batch atomically: either every operation takes effect or
    /// none does.
    async fn apply_batch(&self, batch: WriteBatch) -> AppResult<()>;
}
