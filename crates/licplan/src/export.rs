//! CSV export of a saved project.
//!
//! Produces four sheets next to each other: a summary of the project and
//! its recommendation, the per-discipline requirement coverage, the bill
//! of materials and the decision log.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::store::{ProjectStore, SavedProject};

#[derive(Args, Debug, Clone)]
#[command(about = "Export a saved project as CSV report sheets")]
pub struct ExportArgs {
    /// Project name
    pub name: String,

    /// Output directory (defaults to the current directory)
    #[arg(short, long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub out: Option<PathBuf>,

    /// Project store directory override
    #[arg(long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub store_dir: Option<PathBuf>,
}

pub fn execute(args: ExportArgs) -> Result<()> {
    let store = ProjectStore::open(args.store_dir)?;
    let project = store.find(&args.name)?;

    let dir = args.out.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let stem = sanitize(&project.project.name);
    let sheets = write_sheets(&project, &dir, &stem)?;

    eprintln!("Wrote {} sheets to {}", sheets, dir.display());
    Ok(())
}

fn write_sheets(project: &SavedProject, dir: &Path, stem: &str) -> Result<usize> {
    let summary = dir.join(format!("{stem}_summary.csv"));
    write_summary_csv(project, File::create(&summary)?)
        .with_context(|| format!("failed to write {}", summary.display()))?;

    let requirements = dir.join(format!("{stem}_requirements.csv"));
    project
        .result
        .write_requirements_csv(File::create(&requirements)?)
        .with_context(|| format!("failed to write {}", requirements.display()))?;

    let bom = dir.join(format!("{stem}_bom.csv"));
    project
        .result
        .write_bom_csv(File::create(&bom)?)
        .with_context(|| format!("failed to write {}", bom.display()))?;

    let log = dir.join(format!("{stem}_log.csv"));
    project
        .result
        .write_log_csv(File::create(&log)?)
        .with_context(|| format!("failed to write {}", log.display()))?;

    Ok(4)
}

fn write_summary_csv<W: Write>(project: &SavedProject, writer: W) -> csv::Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["Field", "Value"])?;
    w.write_record(["Project", &project.project.name])?;
    w.write_record([
        "Customer",
        project.project.customer.as_deref().unwrap_or(""),
    ])?;
    w.write_record([
        "Description",
        project.project.description.as_deref().unwrap_or(""),
    ])?;
    w.write_record(["Created", &project.project.created_at.to_rfc3339()])?;
    w.write_record(["Feature set", &project.result.tier.name])?;
    w.write_record(["Feature set code", &project.result.tier.code])?;
    w.write_record(["Part number", &project.result.tier.part_number])?;
    w.write_record(["Reason", &project.result.tier_reason])?;
    w.write_record(["Packages", &project.result.package_count().to_string()])?;
    w.write_record([
        "Compliant",
        if project.result.compliant { "yes" } else { "no" },
    ])?;
    w.flush()?;
    Ok(())
}

/// File-name stem derived from the project name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
