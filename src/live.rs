//! Live schema cache
//!
//! Keeps one mutable in-memory instance per schema name on top of a
//! [`SchemaStore`]. Callers edit live schemas through shared [`LiveSchema`]
//! handles; the edits are committed (version bump + write) when somebody asks
//! the cache to `load` the persisted version of the same schema.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::error::Result;
use crate::schema::Schema;
use crate::storage::SchemaStore;

/// Shared handle to a live schema.
///
/// Every clone points to the same instance, and the cache never swaps the
/// instance behind a name, so holders see saves and commits as they happen.
#[derive(Debug, Clone)]
pub struct LiveSchema(Arc<RwLock<Schema>>);

impl LiveSchema {
    fn new(schema: Schema) -> Self {
        Self(Arc::new(RwLock::new(schema)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Schema> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Schema> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current content
    pub fn snapshot(&self) -> Schema {
        self.read().clone()
    }

    /// True when both handles refer to the same live instance
    pub fn ptr_eq(&self, other: &LiveSchema) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// In-memory overlay of live schemas over a persistent store
#[derive(Debug)]
pub struct LiveSchemaCache<S> {
    store: S,
    live_schemas: HashMap<String, LiveSchema>,
}

impl<S: SchemaStore> LiveSchemaCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            live_schemas: HashMap::new(),
        }
    }

    /// The wrapped persistent store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Live schema for `name`, loading it from the store on first access.
    ///
    /// Never commits. A schema missing from the store surfaces as `NotFound`.
    pub fn get(&mut self, name: &str) -> Result<LiveSchema> {
        if let Some(live) = self.live_schemas.get(name) {
            return Ok(live.clone());
        }
        let schema = self.store.load_schema(name)?;
        debug!(schema = name, version = schema.version(), "materialized live schema");
        Ok(self.update_live_schema(schema))
    }

    /// Commit pending edits to the live schema, then load the persisted one.
    ///
    /// The returned schema is detached from the cache; the live entry is left
    /// as the commit wrote it.
    pub fn load(&mut self, name: &str) -> Result<Schema> {
        self.commit(name)?;
        self.store.load_schema(name)
    }

    /// Save through the store and bring the live entry up to date.
    ///
    /// An existing live instance has its content overwritten in place;
    /// otherwise the saved schema becomes the live instance.
    pub fn save(&mut self, mut schema: Schema) -> Result<PathBuf> {
        let path = self.store.save_schema(&mut schema)?;
        self.update_live_schema(schema);
        Ok(path)
    }

    /// Persist the live schema for `name` if it has unpersisted edits.
    ///
    /// Returns `None` when no live schema exists for `name`.
    pub fn commit(&mut self, name: &str) -> Result<Option<LiveSchema>> {
        let Some(live) = self.live_schemas.get(name) else {
            return Ok(None);
        };
        {
            // check, bump and write under one lock
            let mut schema = live.write();
            if schema.is_modified() {
                // the live instance stays dirty until the write succeeds
                let mut next = schema.clone();
                let (version, hash) = next.bump_version();
                self.store.store_schema(&next)?;
                *schema = next;
                info!(schema = name, version, hash = hash.short(), "committed live schema");
            }
        }
        Ok(Some(live.clone()))
    }

    /// Commit every modified live schema, returning how many were written
    pub fn commit_all(&mut self) -> Result<usize> {
        let mut names: Vec<String> = self
            .live_schemas
            .iter()
            .filter(|(_, live)| live.read().is_modified())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        for name in &names {
            self.commit(name)?;
        }
        Ok(names.len())
    }

    /// Seed the import folder with `schema` unless an import schema exists.
    ///
    /// Does nothing when no import folder is configured.
    pub fn initialize_import_schema(&self, schema: &Schema) -> Result<()> {
        let Some(import_path) = self.store.import_schema_path() else {
            return Ok(());
        };
        match self.store.load_import_schema(schema.name()) {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                self.store.export_schema(schema, import_path)?;
                info!(schema = schema.name(), "initialized import schema");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// True when a live schema exists for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.live_schemas.contains_key(name)
    }

    /// Names with a live schema, sorted
    pub fn live_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.live_schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn update_live_schema(&mut self, schema: Schema) -> LiveSchema {
        if let Some(live) = self.live_schemas.get(schema.name()) {
            live.write().replace_content(&schema);
            return live.clone();
        }
        let name = schema.name().to_string();
        let live = LiveSchema::new(schema);
        self.live_schemas.insert(name, live.clone());
        live
    }
}
