//! `modal validate` command implementation

use crate::catalog::Catalog;
use crate::output::{OutputFormat, print_json, table};
use colored::Colorize;
use std::path::Path;

/// Execute the `modal validate` command
pub fn run(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let catalog = Catalog::load(path)?;
    let problems = catalog.problems();

    match format {
        OutputFormat::Json => print_json(&problems)?,
        OutputFormat::Text if problems.is_empty() => {
            println!(
                "{} {} modals in {} are valid",
                "✓".green(),
                catalog.modals.len(),
                path.display()
            );
        }
        OutputFormat::Text => {
            println!("{} Problems in {}", "✗".red(), path.display());
            println!();
            let rows = problems
                .iter()
                .map(|p| vec![p.modal_id.clone(), p.problem.clone()]);
            println!("{}", table(&["modal", "problem"], rows));
        }
    }

    if !problems.is_empty() {
        anyhow::bail!("{} problem(s) found in catalog", problems.len());
    }
    Ok(())
}
