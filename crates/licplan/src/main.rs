use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

mod calc;
mod catalog;
mod email;
mod export;
mod project;
mod store;

#[derive(Parser)]
#[command(name = "licplan")]
#[command(about = "License sizing and purchase planning for GridPoint sites", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a license recommendation from capacity requirements
    #[command(alias = "c")]
    Calc(calc::CalcArgs),

    /// Inspect the feature-set tiers and expansion packages
    Catalog(catalog::CatalogArgs),

    /// List, show and delete saved projects
    #[command(alias = "p")]
    Project(project::ProjectArgs),

    /// Export a saved project as CSV report sheets
    Export(export::ExportArgs),

    /// Compose a mailto: link summarising a saved project
    Email(email::EmailArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Calc(args) => calc::execute(args),
        Commands::Catalog(args) => catalog::execute(args),
        Commands::Project(args) => project::execute(args),
        Commands::Export(args) => export::execute(args),
        Commands::Email(args) => email::execute(args),
    }
}
