//! Live Schema Storage
//!
//! An in-memory cache of live, editable schemas on top of a file-backed
//! schema store.
//!
//! ## Features
//!
//! - **Live Schemas**: One shared, mutable instance per schema name, loaded lazily
//! - **Commit on Load**: Pending edits are versioned and written before a fresh load
//! - **Version Hashes**: SHA256 content hashes detect unpersisted edits
//! - **Import/Export Folders**: Seed schemas from an import folder, mirror saves to an export folder
//!
//! ## Layout
//!
//! ```text
//! schemas/
//! ├── sales.schema.json
//! ├── import/
//! │   └── sales.schema.json
//! └── export/
//!     └── sales.schema.json
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use live_schemas::{FileSchemaStorage, LiveSchemaCache, StorageConfig};
//!
//! # fn main() -> live_schemas::Result<()> {
//! let storage = FileSchemaStorage::new(StorageConfig::with_volume("schemas"))?;
//! let mut cache = LiveSchemaCache::new(storage);
//!
//! let live = cache.get("sales")?;
//! live.write().set_description("daily sales");
//!
//! // the edit is committed before the persisted schema is read back
//! let persisted = cache.load("sales")?;
//! assert_eq!(persisted.description(), Some("daily sales"));
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod live;
pub mod schema;
pub mod storage;

pub use checksum::Checksum;
pub use config::{OutputFormat, StorageConfig};
pub use error::{Result, SchemaError};
pub use live::{LiveSchema, LiveSchemaCache};
pub use schema::{Schema, StoredSchema};
pub use storage::{FileSchemaStorage, SchemaStore};
