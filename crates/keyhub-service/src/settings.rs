//! Persisted key/value settings.
//!
//! Policy switches (activation required, authorization required) live in
//! the record store so an operator can flip them without redeploying. Keys
//! are uppercased on every access and at most one row exists per key.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use keyhub_core::AppResult;
use keyhub_entity::Setting;
use keyhub_store::{Filter, RecordStore, Row, typed};

/// Store-backed named settings.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn RecordStore>,
}

impl Settings {
    /// Settings over the given store.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// The raw string value, empty when the key is absent.
    pub async fn get_string(&self, key: &str) -> AppResult<String> {
        let row = self.find(key).await?;
        Ok(row.map(|s| s.value).unwrap_or_default())
    }

    /// The value parsed as a boolean. Absent, empty, or unparsable values
    /// read as `false`.
    pub async fn get_bool(&self, key: &str) -> AppResult<bool> {
        let value = self.get_string(key).await?;
        Ok(value.parse().unwrap_or(false))
    }

    /// The value parsed as an integer, or `default` when absent or
    /// unparsable.
    pub async fn get_int(&self, key: &str, default: i64) -> AppResult<i64> {
        let value = self.get_string(key).await?;
        Ok(value.parse().unwrap_or(default))
    }

    /// Set the value, creating or overwriting the single row for the key.
    pub async fn set_string(&self, key: &str, value: &str) -> AppResult<()> {
        let key = normalize(key);
        if let Some(existing) = self.find(&key).await? {
            let mut changes = Row::new();
            changes.insert("value".to_string(), json!(value));
            typed::update_fields::<Setting>(self.store.as_ref(), existing.id, changes).await?;
        } else {
            let setting = Setting {
                id: 0,
                key: key.clone(),
                value: value.to_string(),
                desc: String::new(),
            };
            typed::create(self.store.as_ref(), &setting).await?;
        }
        info!(key = %key, "setting updated");
        Ok(())
    }

    /// Write `default` only when the key has no row yet. Used at startup to
    /// seed policy switches without clobbering operator changes.
    pub async fn ensure(&self, key: &str, default: &str) -> AppResult<()> {
        if self.find(key).await?.is_none() {
            self.set_string(key, default).await?;
        }
        Ok(())
    }

    /// Set a boolean switch.
    pub async fn set_bool(&self, key: &str, value: bool) -> AppResult<()> {
        self.set_string(key, if value { "true" } else { "false" })
            .await
    }

    async fn find(&self, key: &str) -> AppResult<Option<Setting>> {
        typed::get_one(self.store.as_ref(), Filter::by("key", normalize(key))).await
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_uppercase()
}
