use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use licplan_core::Catalog;

use crate::store::ProjectStore;

#[derive(Args, Debug, Clone)]
#[command(about = "List, show and delete saved projects")]
pub struct ProjectArgs {
    /// Project store directory override
    #[arg(long, value_name = "DIR", global = true, value_hint = clap::ValueHint::DirPath)]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProjectCommand {
    /// List saved projects, oldest first
    #[command(alias = "ls")]
    List,
    /// Print a saved project's report
    Show {
        /// Project name
        name: String,

        /// Print the stored input and result as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved project
    #[command(alias = "rm")]
    Delete {
        /// Project name
        name: String,
    },
}

pub fn execute(args: ProjectArgs) -> Result<()> {
    let store = ProjectStore::open(args.store_dir)?;
    match args.command {
        ProjectCommand::List => list(&store),
        ProjectCommand::Show { name, json } => show(&store, &name, json),
        ProjectCommand::Delete { name } => {
            store.delete(&name)?;
            eprintln!("Deleted project '{name}'");
            Ok(())
        }
    }
}

fn list(store: &ProjectStore) -> Result<()> {
    let mut projects = store.load_all()?;
    projects.sort_by(|a, b| a.project.created_at.cmp(&b.project.created_at));

    if projects.is_empty() {
        println!("No saved projects");
        return Ok(());
    }

    for p in projects {
        println!(
            "{}  {:24}  {:10}  {}",
            p.project.created_at.format("%Y-%m-%d %H:%M"),
            p.project.name,
            p.result.tier.code,
            p.project.customer.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn show(store: &ProjectStore, name: &str, json: bool) -> Result<()> {
    let project = store.find(name)?;
    let mut writer = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut writer, &project)?;
        writeln!(writer)?;
    } else {
        // Stored results carry no catalog of their own; unit labels in the
        // rendered report come from the built-in one.
        project
            .result
            .write_report(&Catalog::builtin(), &mut writer)?;
    }
    Ok(())
}
