//! Seed command handler.
//!
//! Loads a text file into the store as a single document under a fixed ID,
//! so reseeding replaces the previous copy.

use clap::Args;
use rag_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// Store a text file as the seed document
#[derive(Args, Debug)]
pub struct SeedCommand {
    /// File to read in full
    #[arg(short, long, default_value = "knowledge.txt")]
    pub file: PathBuf,
}

impl SeedCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Seeding store from {:?}", self.file);

        let store = super::open_store(config)?;
        let item = rag_knowledge::seed_from_file(store.as_ref(), &self.file).await?;

        println!(
            "Stored {} ({} bytes) as '{}' in {:?}",
            self.file.display(),
            item.text.len(),
            item.id,
            config.data_dir
        );
        Ok(())
    }
}
