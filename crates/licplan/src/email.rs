use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::store::{ProjectStore, SavedProject};

#[derive(Args, Debug, Clone)]
#[command(about = "Compose a mailto: link summarising a saved project")]
pub struct EmailArgs {
    /// Project name
    pub name: String,

    /// Recipient address
    #[arg(long, value_name = "ADDR")]
    pub to: Option<String>,

    /// Project store directory override
    #[arg(long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub store_dir: Option<PathBuf>,
}

pub fn execute(args: EmailArgs) -> Result<()> {
    let store = ProjectStore::open(args.store_dir)?;
    let project = store.find(&args.name)?;
    println!("{}", mailto(&project, args.to.as_deref()));
    Ok(())
}

/// Render the project as a `mailto:` URL with the quotation in the body.
fn mailto(project: &SavedProject, to: Option<&str>) -> String {
    let subject = format!("License quotation: {}", project.project.name);

    let mut body = String::new();
    body.push_str(&format!("Project: {}\n", project.project.name));
    if let Some(customer) = &project.project.customer {
        body.push_str(&format!("Customer: {customer}\n"));
    }
    body.push_str(&format!(
        "Feature set: {} ({})\n",
        project.result.tier.name, project.result.tier.code
    ));
    body.push_str(&format!("Reason: {}\n", project.result.tier_reason));

    body.push_str("\nBill of materials:\n");
    body.push_str(&format!(
        "  1 x {} ({})\n",
        project.result.tier.code, project.result.tier.part_number
    ));
    for line in &project.result.bom {
        body.push_str(&format!(
            "  {} x {} ({})\n",
            line.quantity, line.code, line.part_number
        ));
    }

    body.push_str(&format!(
        "\nCompliant: {}\n",
        if project.result.compliant { "yes" } else { "no" }
    ));

    format!(
        "mailto:{}?subject={}&body={}",
        to.unwrap_or(""),
        urlencoding::encode(&subject),
        urlencoding::encode(&body)
    )
}
