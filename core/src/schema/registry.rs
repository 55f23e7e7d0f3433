//! schema/registry.rs
//! Process-wide schema cache with at-most-once fetch per type.
//!
//! Lifecycle:
//! - empty at startup
//! - populated lazily, one fetch per type name
//! - entries are immutable and never evicted
//!
//! Concurrency: lookups take a shared read lock. A miss takes a per-key lock, so concurrent
//! requests for the same missing type perform one fetch and all observe the same `Arc`.
//! Failed fetches are not cached; the next request retries.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::schema::types::{RecordSchema, SchemaError};

/// External collaborator that knows how to obtain a type's definition.
pub trait SchemaFetcher: Send + Sync {
    fn fetch_schema(&self, type_name: &str) -> Result<RecordSchema, SchemaError>;
}

impl<F> SchemaFetcher for F
where
    F: Fn(&str) -> Result<RecordSchema, SchemaError> + Send + Sync,
{
    fn fetch_schema(&self, type_name: &str) -> Result<RecordSchema, SchemaError> {
        self(type_name)
    }
}

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<RecordSchema>>>,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by the whole process.
    pub fn global() -> &'static SchemaRegistry {
        static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();
        GLOBAL.get_or_init(SchemaRegistry::new)
    }

    /// Cached schema for `type_name`, without fetching.
    pub fn get(&self, type_name: &str) -> Option<Arc<RecordSchema>> {
        self.schemas.read().get(type_name).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.read().contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Seed the registry with a schema keyed by its own type name.
    ///
    /// Entries are immutable: if the name is already present the resident schema wins
    /// and is returned.
    pub fn insert(&self, schema: RecordSchema) -> Arc<RecordSchema> {
        let key = schema.type_name().to_string();
        self.store(key, schema)
    }

    /// Return the cached schema or fetch it exactly once.
    pub fn get_or_fetch<F>(&self, type_name: &str, fetcher: &F) -> Result<Arc<RecordSchema>, SchemaError>
    where
        F: SchemaFetcher + ?Sized,
    {
        if let Some(schema) = self.get(type_name) {
            return Ok(schema);
        }

        let slot = {
            let mut inflight = self.inflight.lock();
            inflight.entry(type_name.to_string()).or_default().clone()
        };

        let result = {
            let _guard = slot.lock();
            // Another caller may have finished the fetch while we waited.
            match self.get(type_name) {
                Some(schema) => Ok(schema),
                None => {
                    debug!(type_name, "fetching schema");
                    match fetcher.fetch_schema(type_name) {
                        Ok(schema) => {
                            debug!(type_name, summary = %schema.summary(), "schema registered");
                            Ok(self.store(type_name.to_string(), schema))
                        }
                        Err(e @ SchemaError::NotFound { .. }) => {
                            debug!(type_name, "no schema defined");
                            Err(e)
                        }
                        Err(e) => {
                            warn!(type_name, error = %e, "schema fetch failed");
                            Err(e)
                        }
                    }
                }
            }
        };

        // Last one out removes the slot. Clones are only made under the map lock,
        // so the count is stable here.
        {
            let mut inflight = self.inflight.lock();
            let release = inflight
                .get(type_name)
                .is_some_and(|cur| Arc::ptr_eq(cur, &slot) && Arc::strong_count(&slot) == 2);
            if release {
                inflight.remove(type_name);
            }
        }

        result
    }

    /// Make sure every named type is registered, fetching the missing ones.
    pub fn populate<'a, I, F>(&self, type_names: I, fetcher: &F) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = &'a str>,
        F: SchemaFetcher + ?Sized,
    {
        for type_name in type_names {
            self.get_or_fetch(type_name, fetcher)?;
        }
        Ok(())
    }

    fn store(&self, key: String, schema: RecordSchema) -> Arc<RecordSchema> {
        let mut schemas = self.schemas.write();
        schemas.entry(key).or_insert_with(|| Arc::new(schema)).clone()
    }
}
