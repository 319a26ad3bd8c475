//! `modal compatible` command implementation

use crate::catalog::Catalog;
use crate::cli::ContextArgs;
use crate::output::{OutputFormat, print_json, table};
use colored::Colorize;
use std::path::Path;

/// Execute the `modal compatible` command
pub async fn run(path: &Path, args: &ContextArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (service, _) = Catalog::load(path)?.install().await?;
    let context = args.to_context();
    let compatible = service.engine().get_compatible_modals(&context);

    if format == OutputFormat::Json {
        return print_json(&compatible);
    }

    if compatible.is_empty() {
        println!("{} No modal matches this context.", "!".yellow());
        return Ok(());
    }

    println!("{} Compatible modals (highest priority first)", "→".green());
    println!();
    let rows = compatible.iter().enumerate().filter_map(|(rank, id)| {
        let modal = service.engine().get_modal(id)?;
        Some(vec![
            (rank + 1).to_string(),
            modal.id,
            modal.category,
            modal.priority.to_string(),
        ])
    });
    println!("{}", table(&["#", "id", "category", "priority"], rows));
    Ok(())
}
