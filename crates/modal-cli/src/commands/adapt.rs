//! `modal adapt` command implementation

use crate::catalog::Catalog;
use crate::cli::AdaptArgs;
use crate::output::{OutputFormat, print_json, table};
use chrono::{TimeDelta, Utc};
use colored::Colorize;
use modal_foundation::AdaptationEngine;
use modal_kernel::adaptation::AdaptedModal;
use modal_kernel::{ModalAdaptationContext, WorkoutRecord};
use std::path::Path;

/// Execute the `modal adapt` command
pub async fn run(path: &Path, args: &AdaptArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (service, _) = Catalog::load(path)?.install().await?;
    let adaptation = AdaptationEngine::with_default_rules(service.engine().clone());
    let context = adaptation_context(args)?;

    let adapted: Vec<AdaptedModal> = match &args.modal {
        Some(id) => {
            if !service.engine().is_registered(id) {
                anyhow::bail!("Modal not found: {id}");
            }
            adaptation.adapt_modal(id, &context).into_iter().collect()
        }
        None => adaptation.adapt_compatible_modals(&context),
    };

    if format == OutputFormat::Json {
        return print_json(&adapted);
    }

    if adapted.is_empty() {
        println!("{} No rule applies; modals run as registered.", "✓".green());
        return Ok(());
    }

    for modal in &adapted {
        println!(
            "{} {} {} {}",
            "→".green(),
            modal.original_modal_id.bold(),
            "as".dimmed(),
            modal.adapted_modal_id
        );
        let rows = modal.adaptations_applied.iter().map(|a| {
            vec![
                a.rule_id.clone(),
                a.action.kind().to_string(),
                plain(&a.old_value),
                plain(&a.new_value),
                format!("{:.2}", a.confidence),
            ]
        });
        println!("{}", table(&["rule", "action", "from", "to", "confidence"], rows));
        println!("  {}", modal.explanation);
        println!();
    }
    Ok(())
}

fn adaptation_context(args: &AdaptArgs) -> anyhow::Result<ModalAdaptationContext> {
    let mut context = ModalAdaptationContext::new(args.context.to_context());
    if let Some(energy) = args.energy {
        context = context.with_energy(energy);
    }
    if let Some(recovery) = args.recovery {
        context = context.with_recovery_score(recovery);
    }
    if let Some(days) = args.days_since_workout {
        let Some(last) = TimeDelta::try_days(days).and_then(|d| Utc::now().checked_sub_signed(d))
        else {
            anyhow::bail!("--days-since-workout {days} is out of range");
        };
        context = context.with_workout(WorkoutRecord::new(last, 45.0));
    }
    Ok(context)
}

fn plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ContextArgs, PlatformArg};

    fn args() -> AdaptArgs {
        AdaptArgs {
            context: ContextArgs {
                topic: Some("workout".into()),
                intent: None,
                data_points: Vec::new(),
                platform: PlatformArg::Mobile,
                user: "cli".into(),
            },
            modal: None,
            energy: Some(3.0),
            recovery: None,
            days_since_workout: Some(10),
        }
    }

    #[test]
    fn context_carries_flags() {
        let context = adaptation_context(&args()).unwrap();
        assert_eq!(context.energy_level, Some(3.0));
        assert!(context.recovery_analysis.is_none());
        assert_eq!(context.recent_workouts.len(), 1);
        assert_eq!(context.modal_context.conversation_topic.as_deref(), Some("workout"));
    }

    #[test]
    fn out_of_range_days_are_an_error() {
        for days in [i64::MAX, i64::MIN] {
            let args = AdaptArgs {
                days_since_workout: Some(days),
                ..args()
            };
            let err = adaptation_context(&args).unwrap_err();
            assert!(err.to_string().contains("out of range"));
        }
    }

    #[test]
    fn plain_strips_quotes() {
        assert_eq!(plain(&serde_json::json!("medium")), "medium");
        assert_eq!(plain(&serde_json::json!(3)), "3");
        assert_eq!(plain(&serde_json::Value::Null), "-");
    }
}
