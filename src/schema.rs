//! Schema entity and its stored form

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::checksum::Checksum;
use crate::error::{Result, SchemaError};

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("static pattern"))
}

/// Check that `name` can be used as a schema name (and therefore a file stem)
pub fn validate_name(name: &str) -> Result<()> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidName(name.to_string()))
    }
}

/// A named, versioned schema.
///
/// The version hash is always derived from the current content. The stored
/// version hash records the content as of the last persist, so the two differ
/// exactly when the schema carries unpersisted edits.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    version: u64,
    description: Option<String>,
    tables: BTreeMap<String, serde_json::Value>,
    stored_version_hash: Checksum,
    imported_version_hash: Option<Checksum>,
    updated_at: DateTime<Utc>,
}

impl Schema {
    /// Create a new, empty schema at version 1
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        let mut schema = Self {
            name,
            version: 1,
            description: None,
            tables: BTreeMap::new(),
            stored_version_hash: Checksum::from(String::new()),
            imported_version_hash: None,
            updated_at: Utc::now(),
        };
        schema.stored_version_hash = schema.version_hash();
        Ok(schema)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn tables(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&serde_json::Value> {
        self.tables.get(name)
    }

    /// Add or replace a table definition
    pub fn set_table(&mut self, name: impl Into<String>, definition: serde_json::Value) {
        self.tables.insert(name.into(), definition);
    }

    pub fn remove_table(&mut self, name: &str) -> Option<serde_json::Value> {
        self.tables.remove(name)
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Hash of the current content
    pub fn version_hash(&self) -> Checksum {
        Checksum::from_json(&json!({
            "name": self.name,
            "description": self.description,
            "tables": self.tables,
        }))
    }

    /// Hash of the content as of the last persist
    pub fn stored_version_hash(&self) -> &Checksum {
        &self.stored_version_hash
    }

    /// Hash of the import schema this schema was last seeded from
    pub fn imported_version_hash(&self) -> Option<&Checksum> {
        self.imported_version_hash.as_ref()
    }

    pub(crate) fn set_imported_version_hash(&mut self, hash: Checksum) {
        self.imported_version_hash = Some(hash);
    }

    /// Reset the version counter and stored hash, keeping the content
    pub(crate) fn rebase(&mut self, version: u64, stored_version_hash: Checksum) {
        self.version = version;
        self.stored_version_hash = stored_version_hash;
    }

    /// True when the content changed since it was last persisted
    pub fn is_modified(&self) -> bool {
        self.version_hash() != self.stored_version_hash
    }

    /// Advance the version if the content changed and mark it as stored.
    ///
    /// Returns the (possibly unchanged) version and its hash.
    pub fn bump_version(&mut self) -> (u64, Checksum) {
        let hash = self.version_hash();
        if hash != self.stored_version_hash {
            self.version += 1;
            self.stored_version_hash = hash.clone();
            self.updated_at = Utc::now();
        }
        (self.version, hash)
    }

    /// Overwrite every field with the content of `other`, keeping this instance
    pub fn replace_content(&mut self, other: &Schema) {
        self.clone_from(other);
    }

    /// Serializable snapshot carrying the stored version hash
    pub fn to_stored(&self) -> StoredSchema {
        StoredSchema {
            name: self.name.clone(),
            version: self.version,
            version_hash: self.stored_version_hash.clone(),
            imported_version_hash: self.imported_version_hash.clone(),
            updated_at: self.updated_at,
            description: self.description.clone(),
            tables: self.tables.clone(),
        }
    }

    /// Rebuild a schema from its stored form
    pub fn from_stored(stored: StoredSchema) -> Result<Self> {
        validate_name(&stored.name)?;
        Ok(Self {
            name: stored.name,
            version: stored.version,
            description: stored.description,
            tables: stored.tables,
            stored_version_hash: stored.version_hash,
            imported_version_hash: stored.imported_version_hash,
            updated_at: stored.updated_at,
        })
    }
}

/// On-disk representation of a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSchema {
    pub name: String,
    pub version: u64,
    pub version_hash: Checksum,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_version_hash: Option<Checksum>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tables: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> Schema {
        let mut schema = Schema::new("sales").unwrap();
        schema.set_table("orders", json!({"columns": {"id": {"data_type": "bigint"}}}));
        schema.bump_version();
        schema
    }

    #[test]
    fn test_name_validation() {
        assert!(Schema::new("sales_2024").is_ok());
        assert!(Schema::new("_staging").is_ok());
        assert!(matches!(Schema::new("Sales"), Err(SchemaError::InvalidName(_))));
        assert!(Schema::new("../etc").is_err());
        assert!(Schema::new("").is_err());
    }

    #[test]
    fn test_new_schema_is_unmodified() {
        let schema = Schema::new("sales").unwrap();
        assert_eq!(schema.version(), 1);
        assert!(!schema.is_modified());
    }

    #[test]
    fn test_edit_marks_modified() {
        let mut schema = sales();
        assert!(!schema.is_modified());

        schema.set_table("refunds", json!({}));
        assert!(schema.is_modified());
        assert_ne!(&schema.version_hash(), schema.stored_version_hash());
    }

    #[test]
    fn test_bump_version() {
        let mut schema = sales();
        let before = schema.version();

        let (version, _) = schema.bump_version();
        assert_eq!(version, before, "unmodified schema keeps its version");

        schema.set_description("daily sales");
        let (version, hash) = schema.bump_version();
        assert_eq!(version, before + 1);
        assert_eq!(&hash, schema.stored_version_hash());
        assert!(!schema.is_modified());
    }

    #[test]
    fn test_replace_content() {
        let mut live = sales();
        let mut other = sales();
        other.set_table("customers", json!({"columns": {}}));
        other.bump_version();

        live.replace_content(&other);
        assert_eq!(live, other);
    }

    #[test]
    fn test_stored_form_preserves_hashes() {
        let mut schema = sales();
        schema.set_table("refunds", json!({}));

        let restored = Schema::from_stored(schema.to_stored()).unwrap();
        assert_eq!(restored.stored_version_hash(), schema.stored_version_hash());
        assert!(restored.is_modified(), "pending edits survive a snapshot");
    }

    #[test]
    fn test_stored_form_rejects_bad_name() {
        let mut stored = sales().to_stored();
        stored.name = "Bad Name".into();
        assert!(Schema::from_stored(stored).is_err());
    }
}
