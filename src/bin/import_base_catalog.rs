// ABOUTME: Base ingredient catalog importer
// ABOUTME: Upserts a JSON array of ingredient records into the system-wide catalog in one transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! Base catalog importer
//!
//! Usage:
//! ```bash
//! # Import using DATABASE_URL from environment
//! import-base-catalog --file ingredientes.json
//!
//! # Override database URL
//! import-base-catalog --file ingredientes.json --database-url sqlite:./data/formulador.db
//! ```
//!
//! Records accept the spreadsheet column names (`nombre`, `precio_por_kg`,
//! `categoria`, `Ve_Protein_Percent`) as aliases. Re-importing a name
//! replaces its attributes.

use anyhow::{Context, Result};
use clap::Parser;
use formulador::{
    config::{DatabaseConfig, DatabaseUrl},
    database::Database,
    logging,
    models::IngredientAttributes,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "import-base-catalog",
    about = "Formulador base ingredient catalog importer",
    long_about = "Upsert base ingredients from a JSON array into the system-wide catalog"
)]
struct ImportArgs {
    /// JSON file holding an array of ingredient records
    #[arg(long)]
    file: PathBuf,

    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ImportArgs::parse();
    logging::init_from_env()?;

    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let records: Vec<IngredientAttributes> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    let mut config = DatabaseConfig::from_env()?;
    if let Some(url) = args.database_url.as_deref() {
        config.url = DatabaseUrl::parse_url(url)?;
    }
    let database = Database::new(&config).await?;

    info!(file = %args.file.display(), records = records.len(), "Importing base catalog");
    let imported = database.base_ingredients().import_catalog(&records).await?;
    info!(imported, "Base catalog import complete");

    Ok(())
}
