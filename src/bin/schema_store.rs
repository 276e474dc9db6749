//! Schema Store CLI
//!
//! Inspect and maintain a schema volume.

use std::path::PathBuf;
use clap::{Parser, Subcommand};
use live_schemas::{FileSchemaStorage, LiveSchemaCache, SchemaStore, StorageConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-store")]
#[command(about = "Inspect and maintain a schema volume")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Schema volume path (overrides config)
    #[arg(short, long)]
    volume: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored schemas
    List,

    /// Show a stored schema
    Show {
        /// Schema name
        name: String,
    },

    /// Commit pending changes of a schema and print its version
    Bump {
        /// Schema name
        name: String,
    },

    /// Copy a stored schema into the import folder if none is there yet
    InitImport {
        /// Schema name
        name: String,
    },

    /// Delete a stored schema
    Remove {
        /// Schema name
        name: String,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = StorageConfig::load_from(cli.config.as_deref())?;
    if let Some(volume) = cli.volume {
        config.storage.schema_volume_path = volume;
    }

    match cli.command {
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }

        Commands::List => {
            let storage = FileSchemaStorage::new(config)?;
            let names = storage.list_schemas()?;
            if names.is_empty() {
                println!("No schemas in {:?}", storage.config().storage.schema_volume_path);
            }
            for name in names {
                let schema = storage.load_schema(&name)?;
                println!("{:<32} v{:<6} {}", name, schema.version(), schema.stored_version_hash().short());
            }
        }

        Commands::Show { name } => {
            let storage = FileSchemaStorage::new(config)?;
            let schema = storage.load_schema(&name)?;
            println!("{}", serde_json::to_string_pretty(&schema.to_stored())?);
        }

        Commands::Bump { name } => {
            let storage = FileSchemaStorage::new(config)?;
            let mut cache = LiveSchemaCache::new(storage);
            let live = cache.get(&name)?;
            let modified = live.read().is_modified();
            cache.commit(&name)?;
            let schema = live.read();
            if modified {
                println!("Committed {} at version {}", name, schema.version());
            } else {
                println!("{} is unchanged at version {}", name, schema.version());
            }
        }

        Commands::InitImport { name } => {
            let storage = FileSchemaStorage::new(config)?;
            if storage.import_schema_path().is_none() {
                return Err("no import_schema_path configured".into());
            }
            let cache = LiveSchemaCache::new(storage);
            let schema = cache.store().load_schema(&name)?;
            cache.initialize_import_schema(&schema)?;
            println!("Import schema for {} is in place", name);
        }

        Commands::Remove { name } => {
            let storage = FileSchemaStorage::new(config)?;
            storage.remove_schema(&name)?;
            println!("Removed {}", name);
        }
    }

    Ok(())
}
