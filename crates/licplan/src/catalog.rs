use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use licplan_core::Catalog;

#[derive(Args, Debug, Clone)]
#[command(about = "Inspect the feature-set tiers and expansion packages")]
pub struct CatalogArgs {
    /// Catalog JSON file to use instead of the built-in one
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CatalogCommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CatalogCommand {
    /// List the feature-set tiers with their embedded capacities
    Tiers,
    /// List the purchasable expansion packages per discipline
    Packages,
}

pub fn execute(args: CatalogArgs) -> Result<()> {
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_file(path)
            .with_context(|| format!("failed to load catalog from {}", path.display()))?,
        None => Catalog::builtin(),
    };

    let mut writer = io::stdout().lock();
    match args.command {
        Some(CatalogCommand::Tiers) => catalog.write_tier_table(&mut writer)?,
        Some(CatalogCommand::Packages) => catalog.write_package_table(&mut writer)?,
        None => {
            catalog.write_tier_table(&mut writer)?;
            catalog.write_package_table(&mut writer)?;
        }
    }
    Ok(())
}
