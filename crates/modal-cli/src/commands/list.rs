//! `modal list` command implementation

use crate::catalog::Catalog;
use crate::output::{OutputFormat, join_or_dash, print_json, table};
use colored::Colorize;
use modal_kernel::ModalDescriptor;
use serde::Serialize;
use std::path::Path;

/// Execute the `modal list` command
pub async fn run(path: &Path, enabled_only: bool, format: OutputFormat) -> anyhow::Result<()> {
    let (service, outcomes) = Catalog::load(path)?.install().await?;

    let modals: Vec<ModalDescriptor> = service
        .engine()
        .get_registry()
        .into_iter()
        .filter(|m| !enabled_only || m.enabled)
        .collect();

    let failed: Vec<FailedInstall> = outcomes
        .into_iter()
        .filter_map(|o| {
            o.error.map(|error| FailedInstall {
                modal_id: o.modal_id,
                error,
            })
        })
        .collect();

    if format == OutputFormat::Json {
        return print_json(&ListOutput { modals, failed });
    }

    println!("{} Registered modals", "→".green());
    println!();

    if modals.is_empty() {
        println!("  No modals registered.");
    } else {
        let rows = modals.iter().map(|m| {
            vec![
                m.id.clone(),
                m.name.clone(),
                m.category.clone(),
                m.priority.to_string(),
                if m.enabled { "yes".to_string() } else { "no".to_string() },
                join_or_dash(&m.activation_triggers),
                join_or_dash(&m.dependencies),
            ]
        });
        println!(
            "{}",
            table(
                &["id", "name", "category", "priority", "enabled", "triggers", "depends on"],
                rows
            )
        );
    }

    for failure in &failed {
        println!("  {} {}: {}", "✗".red(), failure.modal_id, failure.error);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ListOutput {
    modals: Vec<ModalDescriptor>,
    failed: Vec<FailedInstall>,
}

#[derive(Debug, Serialize)]
struct FailedInstall {
    modal_id: String,
    error: String,
}
