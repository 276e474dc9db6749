//! Persistent schema storage
//!
//! Schemas are kept as one JSON file per schema:
//!
//! ```text
//! schemas/
//! ├── sales.schema.json
//! ├── customers.schema.json
//! ├── import/            (optional, seeds and updates stored schemas)
//! │   └── sales.schema.json
//! └── export/            (optional, receives a copy of every save)
//!     └── sales.schema.json
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{OutputFormat, StorageConfig};
use crate::error::{Result, SchemaError};
use crate::schema::{validate_name, Schema, StoredSchema};

const SCHEMA_FILE_SUFFIX: &str = ".schema.json";

/// Operations the live cache needs from a persistent store
pub trait SchemaStore {
    /// Load the persisted schema. Fails with `NotFound` when absent.
    fn load_schema(&self, name: &str) -> Result<Schema>;

    /// Bump the version, persist, and export when an export folder is set
    fn save_schema(&self, schema: &mut Schema) -> Result<PathBuf>;

    /// Persist the schema exactly as given
    fn store_schema(&self, schema: &Schema) -> Result<PathBuf>;

    /// Load the import schema. Fails with `NotFound` when absent.
    fn load_import_schema(&self, name: &str) -> Result<Schema>;

    /// Write the schema into `dir`, returning the file written
    fn export_schema(&self, schema: &Schema, dir: &Path) -> Result<PathBuf>;

    fn import_schema_path(&self) -> Option<&Path>;
}

/// File-backed schema store
#[derive(Debug)]
pub struct FileSchemaStorage {
    config: StorageConfig,
}

impl FileSchemaStorage {
    /// Open the storage, creating the volume (and export) folders
    pub fn new(config: StorageConfig) -> Result<Self> {
        fs::create_dir_all(&config.storage.schema_volume_path)?;
        if let Some(export) = &config.storage.export_schema_path {
            fs::create_dir_all(export)?;
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Path of the stored schema file for `name`
    pub fn schema_path(&self, name: &str) -> PathBuf {
        schema_file(&self.config.storage.schema_volume_path, name)
    }

    /// Names of all stored schemas, sorted
    pub fn list_schemas(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config.storage.schema_volume_path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name
                .to_str()
                .and_then(|f| f.strip_suffix(SCHEMA_FILE_SUFFIX))
            else {
                continue;
            };
            if validate_name(name).is_ok() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn has_schema(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.schema_path(name).is_file()
    }

    /// Delete a stored schema
    pub fn remove_schema(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        match fs::remove_file(self.schema_path(name)) {
            Ok(()) => {
                info!(schema = name, "removed schema");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SchemaError::not_found(name)),
            Err(e) => Err(e.into()),
        }
    }

    fn read_stored(&self, name: &str) -> Result<Option<Schema>> {
        validate_name(name)?;
        read_schema_file(&self.schema_path(name))
    }

    /// Reconcile a stored schema with the import schema, if one exists
    fn maybe_import(&self, name: &str, stored: Option<Schema>) -> Result<Option<Schema>> {
        let imported = match self.load_import_schema(name) {
            Ok(imported) => imported,
            Err(e) if e.is_not_found() => return Ok(stored),
            Err(e) => return Err(e),
        };
        let import_hash = imported.version_hash();

        let mut schema = match stored {
            Some(stored) if stored.imported_version_hash() == Some(&import_hash) => {
                return Ok(Some(stored));
            }
            Some(mut stored) => {
                info!(schema = name, import_hash = import_hash.short(), "import schema changed, updating stored schema");
                let version = stored.version();
                let stored_hash = stored.stored_version_hash().clone();
                stored.replace_content(&imported);
                // keep counting from the stored version
                stored.rebase(version, stored_hash);
                stored
            }
            None => {
                info!(schema = name, "seeding schema from import folder");
                imported
            }
        };

        schema.set_imported_version_hash(import_hash);
        schema.bump_version();
        self.store_schema(&schema)?;
        Ok(Some(schema))
    }

    fn write_json(&self, path: &Path, stored: &StoredSchema) -> Result<()> {
        let content = match self.config.export.output_format {
            OutputFormat::Pretty => serde_json::to_string_pretty(stored)?,
            OutputFormat::Compact => serde_json::to_string(stored)?,
        };
        fs::write(path, content)?;
        Ok(())
    }
}

impl SchemaStore for FileSchemaStorage {
    fn load_schema(&self, name: &str) -> Result<Schema> {
        let stored = self.read_stored(name)?;
        let schema = if self.config.storage.import_schema_path.is_some() {
            self.maybe_import(name, stored)?
        } else {
            stored
        };
        let schema = schema.ok_or_else(|| SchemaError::not_found(name))?;
        debug!(schema = name, version = schema.version(), "loaded schema");
        Ok(schema)
    }

    fn save_schema(&self, schema: &mut Schema) -> Result<PathBuf> {
        schema.bump_version();
        let path = self.store_schema(schema)?;
        if let Some(export) = &self.config.storage.export_schema_path {
            self.export_schema(schema, export)?;
        }
        Ok(path)
    }

    fn store_schema(&self, schema: &Schema) -> Result<PathBuf> {
        let path = self.schema_path(schema.name());
        self.write_json(&path, &schema.to_stored())?;
        debug!(
            schema = schema.name(),
            version = schema.version(),
            hash = schema.stored_version_hash().short(),
            "stored schema"
        );
        Ok(path)
    }

    fn load_import_schema(&self, name: &str) -> Result<Schema> {
        validate_name(name)?;
        let dir = self
            .config
            .storage
            .import_schema_path
            .as_deref()
            .ok_or_else(|| SchemaError::not_found(name))?;
        read_schema_file(&schema_file(dir, name))?.ok_or_else(|| SchemaError::not_found(name))
    }

    fn export_schema(&self, schema: &Schema, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = schema_file(dir, schema.name());
        self.write_json(&path, &schema.to_stored())?;
        info!(schema = schema.name(), path = %path.display(), "exported schema");
        Ok(path)
    }

    fn import_schema_path(&self) -> Option<&Path> {
        self.config.storage.import_schema_path.as_deref()
    }
}

fn schema_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}{}", name, SCHEMA_FILE_SUFFIX))
}

/// Read a schema file; a missing file is `Ok(None)`
fn read_schema_file(path: &Path) -> Result<Option<Schema>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let stored: StoredSchema = serde_json::from_str(&content).map_err(|e| SchemaError::InvalidFormat {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Schema::from_stored(stored).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn schema(name: &str, table: &str) -> Schema {
        let mut schema = Schema::new(name).unwrap();
        schema.set_table(table, json!({"columns": {}}));
        schema
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileSchemaStorage::new(StorageConfig::with_volume(dir.path())).unwrap();
        let err = storage.load_schema("sales").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let storage = FileSchemaStorage::new(StorageConfig::with_volume(dir.path())).unwrap();

        let mut sales = schema("sales", "orders");
        let path = storage.save_schema(&mut sales).unwrap();
        assert_eq!(path, dir.path().join("sales.schema.json"));
        assert!(!sales.is_modified());

        let loaded = storage.load_schema("sales").unwrap();
        assert_eq!(loaded, sales);
        assert!(!loaded.is_modified());
    }

    #[test]
    fn test_save_exports_copy() {
        let dir = tempdir().unwrap();
        let export = dir.path().join("export");
        let config = StorageConfig::with_volume(dir.path().join("vol")).export_schema_path(&export);
        let storage = FileSchemaStorage::new(config).unwrap();

        storage.save_schema(&mut schema("sales", "orders")).unwrap();
        assert!(export.join("sales.schema.json").is_file());
    }

    #[test]
    fn test_store_schema_does_not_bump() {
        let dir = tempdir().unwrap();
        let storage = FileSchemaStorage::new(StorageConfig::with_volume(dir.path())).unwrap();

        let mut sales = schema("sales", "orders");
        storage.store_schema(&sales).unwrap();
        assert!(sales.is_modified());

        let loaded = storage.load_schema("sales").unwrap();
        assert_eq!(loaded.version(), 1);
        assert!(loaded.is_modified());

        sales.bump_version();
        storage.store_schema(&sales).unwrap();
        assert_eq!(storage.load_schema("sales").unwrap().version(), 2);
    }

    #[test]
    fn test_list_has_remove() {
        let dir = tempdir().unwrap();
        let storage = FileSchemaStorage::new(StorageConfig::with_volume(dir.path())).unwrap();
        storage.save_schema(&mut schema("sales", "orders")).unwrap();
        storage.save_schema(&mut schema("customers", "people")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(storage.list_schemas().unwrap(), vec!["customers", "sales"]);
        assert!(storage.has_schema("sales"));

        storage.remove_schema("sales").unwrap();
        assert!(!storage.has_schema("sales"));
        assert!(storage.remove_schema("sales").unwrap_err().is_not_found());
    }

    #[test]
    fn test_corrupt_file_is_invalid_format() {
        let dir = tempdir().unwrap();
        let storage = FileSchemaStorage::new(StorageConfig::with_volume(dir.path())).unwrap();
        fs::write(storage.schema_path("sales"), "{not json").unwrap();

        let err = storage.load_schema("sales").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFormat { .. }));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let dir = tempdir().unwrap();
        let storage = FileSchemaStorage::new(StorageConfig::with_volume(dir.path())).unwrap();
        assert!(matches!(storage.load_schema("../x"), Err(SchemaError::InvalidName(_))));
    }

    #[test]
    fn test_load_seeds_from_import() {
        let dir = tempdir().unwrap();
        let import = dir.path().join("import");
        let config = StorageConfig::with_volume(dir.path().join("vol")).import_schema_path(&import);
        let storage = FileSchemaStorage::new(config).unwrap();

        let seed = schema("sales", "orders");
        storage.export_schema(&seed, &import).unwrap();

        let loaded = storage.load_schema("sales").unwrap();
        assert!(loaded.table("orders").is_some());
        assert_eq!(loaded.imported_version_hash(), Some(&seed.version_hash()));
        assert!(storage.has_schema("sales"), "seeded schema is persisted");
    }

    #[test]
    fn test_changed_import_replaces_stored_content() {
        let dir = tempdir().unwrap();
        let import = dir.path().join("import");
        let config = StorageConfig::with_volume(dir.path().join("vol")).import_schema_path(&import);
        let storage = FileSchemaStorage::new(config).unwrap();

        storage.export_schema(&schema("sales", "orders"), &import).unwrap();
        let first = storage.load_schema("sales").unwrap();

        // unchanged import: stored schema returned as is
        let again = storage.load_schema("sales").unwrap();
        assert_eq!(again, first);

        storage.export_schema(&schema("sales", "refunds"), &import).unwrap();
        let updated = storage.load_schema("sales").unwrap();
        assert!(updated.table("refunds").is_some());
        assert!(updated.table("orders").is_none());
        assert_eq!(updated.version(), first.version() + 1);
    }
}
