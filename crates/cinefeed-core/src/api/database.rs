use std::path::Path;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::schema::EntitySchema;
use crate::storage::{MemoryStore, RangeStore};
use crate::types::{APP_VERSION, Record};

use super::builders::ListBuilder;

/// The content API handle.
///
/// Every operation takes the [`EntitySchema`] it applies to; the schema's
/// partition selects where records live, so one handle serves every entity.
/// `CinefeedDB` is cheaply clonable when its store is, and `Send + Sync`.
/// Ids come from the store, so handles over clones of one store share a
/// single creation order.
#[derive(Clone)]
pub struct CinefeedDB<S = MemoryStore> {
    store: S,
}

impl CinefeedDB<MemoryStore> {
    /// A handle over a fresh volatile store.
    pub fn in_memory() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// A handle over the durable store journaled at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self::with_store(MemoryStore::open(path)?))
    }
}

impl<S: RangeStore> CinefeedDB<S> {
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch a record by id.
    pub fn get(&self, schema: &EntitySchema, id: &str) -> Result<Record, Error> {
        self.store
            .get(schema.partition, id)?
            .ok_or_else(|| Error::not_found(schema.name, id))
    }

    /// Validate `input`, assign a fresh id, stamp timestamps, and persist.
    pub fn create(&self, schema: &EntitySchema, input: Value) -> Result<Record, Error> {
        let fields = schema.validate_create(input)?;
        let id = self.store.ids().next_id()?;
        let now = Utc::now();

        let record = Record {
            partition: schema.partition.to_string(),
            sort_key: id.clone(),
            id,
            created_on: now,
            saved_on: now,
            app_version: APP_VERSION.to_string(),
            fields,
        };
        self.store.put(&record)?;

        debug!(entity = schema.name, id = %record.id, "record created");
        Ok(record)
    }

    /// Merge `input` onto an existing record and persist the result.
    ///
    /// A `null` attribute in `input` removes that attribute. Identity and
    /// `createdOn` are preserved; `savedOn` is refreshed.
    pub fn update(&self, schema: &EntitySchema, id: &str, input: Value) -> Result<Record, Error> {
        let changes = schema.validate_update(input)?;
        let mut record = self.get(schema, id)?;

        for (name, value) in changes {
            if value.is_null() {
                record.fields.remove(&name);
            } else {
                record.fields.insert(name, value);
            }
        }
        record.saved_on = Utc::now();
        record.app_version = APP_VERSION.to_string();
        self.store.put(&record)?;

        debug!(entity = schema.name, id, "record updated");
        Ok(record)
    }

    /// Remove a record, returning it as it was before deletion.
    pub fn delete(&self, schema: &EntitySchema, id: &str) -> Result<Record, Error> {
        let record = self.get(schema, id)?;
        self.store.delete(schema.partition, id)?;

        debug!(entity = schema.name, id, "record deleted");
        Ok(record)
    }

    /// List a page of records.
    pub fn list(&self, schema: &'static EntitySchema) -> ListBuilder<'_, S> {
        ListBuilder::new(self, schema)
    }
}
