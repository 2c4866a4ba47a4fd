use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use licplan_core::{
    CalcInput, Catalog, Discipline, LicenseEngine, Requirements, Rules, Strategy,
};

use crate::store::{ProjectStore, SavedProject};

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable report with utilization and purchase tables
    #[default]
    Table,
    /// Raw calculation result as JSON
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum CoverStrategy {
    /// Minimum-waste dynamic programming cover
    #[default]
    Exact,
    /// Iteration-capped depth-first cover
    Bounded,
}

impl fmt::Display for CoverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverStrategy::Exact => write!(f, "exact"),
            CoverStrategy::Bounded => write!(f, "bounded"),
        }
    }
}

impl From<CoverStrategy> for Strategy {
    fn from(value: CoverStrategy) -> Self {
        match value {
            CoverStrategy::Exact => Strategy::Exact,
            CoverStrategy::Bounded => Strategy::Bounded,
        }
    }
}

#[derive(Args, Debug, Clone)]
#[command(about = "Calculate a license recommendation from capacity requirements")]
pub struct CalcArgs {
    /// Building automation data points
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub ba: u32,

    /// Fire detection points
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub fire: u32,

    /// Electrical distribution points
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub elec: u32,

    /// SCADA telemetry tags
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub scada: u32,

    /// Consumption meters
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub meter: u32,

    /// Concurrent operator clients
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub clients: u32,

    /// Validated monitoring points
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub vm: u32,

    /// Enable a project feature flag (repeatable)
    #[arg(long = "feature", value_name = "NAME")]
    pub features: Vec<String>,

    /// The site holds an active software-update subscription
    #[arg(long)]
    pub subscription: bool,

    /// Package covering strategy
    #[arg(long, value_enum, default_value_t = CoverStrategy::Exact)]
    pub strategy: CoverStrategy,

    /// Output format
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Catalog JSON file to use instead of the built-in one
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    /// Rules JSON file to use instead of the built-in one
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub rules: Option<PathBuf>,

    /// Save the calculation as a named project
    #[arg(long, value_name = "NAME")]
    pub save: Option<String>,

    /// Customer recorded on the saved project
    #[arg(long, value_name = "NAME", requires = "save")]
    pub customer: Option<String>,

    /// Free-form note recorded on the saved project
    #[arg(long, value_name = "TEXT", requires = "save")]
    pub description: Option<String>,

    /// Project store directory override
    #[arg(long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub store_dir: Option<PathBuf>,
}

impl CalcArgs {
    fn requirements(&self) -> Requirements {
        Requirements::new()
            .with(Discipline::BuildingAutomation, self.ba)
            .with(Discipline::Fire, self.fire)
            .with(Discipline::Electrical, self.elec)
            .with(Discipline::Scada, self.scada)
            .with(Discipline::Metering, self.meter)
            .with(Discipline::Clients, self.clients)
            .with(Discipline::ValidatedMonitoring, self.vm)
    }
}

pub fn execute(args: CalcArgs) -> Result<()> {
    let engine =
        build_engine(args.catalog.as_deref(), args.rules.as_deref())?.with_strategy(args.strategy.into());

    let input = CalcInput {
        requirements: args.requirements(),
        enabled_features: args.features.iter().cloned().collect(),
        subscription_active: args.subscription,
        growth_percent: None,
    };

    let result = engine.calculate(&input);

    let mut writer = io::stdout().lock();
    match args.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &result)?;
            writeln!(writer)?;
        }
        OutputFormat::Table => result.write_report(engine.catalog(), &mut writer)?,
    }

    if let Some(name) = args.save {
        let store = ProjectStore::open(args.store_dir)?;
        store.save(SavedProject::new(
            name.clone(),
            args.customer,
            args.description,
            input,
            result,
        ))?;
        eprintln!("Saved project '{name}'");
    }

    Ok(())
}

/// Load the catalog and rules from the given paths, falling back to the
/// embedded defaults, and wire them into an engine.
pub fn build_engine(catalog: Option<&Path>, rules: Option<&Path>) -> Result<LicenseEngine> {
    let catalog = match catalog {
        Some(path) => Catalog::from_file(path)
            .with_context(|| format!("failed to load catalog from {}", path.display()))?,
        None => Catalog::builtin(),
    };
    let rules = match rules {
        Some(path) => Rules::from_file(path, &catalog)
            .with_context(|| format!("failed to load rules from {}", path.display()))?,
        None => Rules::builtin(),
    };
    LicenseEngine::new(catalog, rules).context("catalog and rules are inconsistent")
}
