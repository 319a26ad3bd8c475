//! `modal orchestrate` command implementation

use crate::catalog::Catalog;
use crate::cli::ContextArgs;
use crate::output::{OutputFormat, print_json, table};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

/// Execute the `modal orchestrate` command
pub async fn run(path: &Path, args: &ContextArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (service, _) = Catalog::load(path)?.install().await?;
    let context = args.to_context();

    let compatible = service.engine().get_compatible_modals(&context);
    let responses = service.orchestrate(&context);
    let analytics = service.engine().get_analytics();

    let rows: Vec<OrchestrationRow> = compatible
        .into_iter()
        .zip(responses)
        .map(|(modal_id, response)| OrchestrationRow {
            modal_id,
            activated: response.activated,
            execution_time_ms: response.execution_time_ms,
            error: response.error_message,
        })
        .collect();

    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({
            "results": rows,
            "analytics": analytics,
        }));
    }

    println!("{} Orchestration results", "→".green());
    println!();
    let table_rows = rows.iter().map(|r| {
        vec![
            r.modal_id.clone(),
            if r.activated { "active".green().to_string() } else { "refused".red().to_string() },
            format!("{:.2}", r.execution_time_ms),
            r.error.clone().unwrap_or_else(|| "-".to_string()),
        ]
    });
    println!("{}", table(&["id", "state", "ms", "reason"], table_rows));
    println!();
    println!(
        "  active: {}   memory: {:.0}/{:.0} MB   conflicts: {}",
        analytics.active_modals.len(),
        analytics.resource_usage.memory,
        analytics.resource_ceiling.memory,
        analytics.conflicts_detected,
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct OrchestrationRow {
    modal_id: String,
    activated: bool,
    execution_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}
