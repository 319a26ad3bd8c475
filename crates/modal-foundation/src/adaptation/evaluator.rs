//! Default condition interpretation.

use chrono::{DateTime, Utc};
use modal_kernel::adaptation::{Condition, ConditionEvaluator, ConditionSubject};
use modal_kernel::{ModalAdaptationContext, WorkoutRecord};
use serde_json::Value;

/// Number of most recent sessions inspected for a plateau.
pub const PLATEAU_WINDOW: usize = 4;

/// Duration variance (minutes²) below which the window counts as a plateau.
pub const PLATEAU_VARIANCE_THRESHOLD: f64 = 5.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Reads subjects straight from the adaptation context. A subject with no
/// data (no energy reported, no workouts logged, unknown field) makes the
/// condition false.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConditionEvaluator;

impl ConditionEvaluator for DefaultConditionEvaluator {
    fn evaluate(
        &self,
        condition: &Condition,
        context: &ModalAdaptationContext,
        now: DateTime<Utc>,
    ) -> bool {
        match subject_value(&condition.subject, context, now) {
            Some(actual) => condition.operator.compare(&actual, &condition.value),
            None => false,
        }
    }
}

fn subject_value(
    subject: &ConditionSubject,
    context: &ModalAdaptationContext,
    now: DateTime<Utc>,
) -> Option<Value> {
    match subject {
        ConditionSubject::EnergyLevel => context.energy_level.map(Value::from),
        ConditionSubject::RecoveryScore => {
            context.recovery_analysis.as_ref().map(|r| Value::from(r.score))
        }
        ConditionSubject::TrainingDelay => {
            training_delay_days(&context.recent_workouts, now).map(Value::from)
        }
        ConditionSubject::PerformancePlateau => {
            Some(Value::Bool(is_plateau(&context.recent_workouts)))
        }
        ConditionSubject::Field { path } => {
            let root = serde_json::to_value(context).ok()?;
            lookup_path(&root, path).cloned()
        }
    }
}

/// Whole days since the most recent workout, rounded up. Workouts dated in
/// the future count as today.
pub fn training_delay_days(workouts: &[WorkoutRecord], now: DateTime<Utc>) -> Option<i64> {
    let latest = workouts.iter().map(|w| w.date).max()?;
    let seconds = (now - latest).num_seconds().max(0) as f64;
    Some((seconds / SECONDS_PER_DAY).ceil() as i64)
}

/// `true` when the last [`PLATEAU_WINDOW`] sessions (by date) have a
/// duration variance under [`PLATEAU_VARIANCE_THRESHOLD`].
pub fn is_plateau(workouts: &[WorkoutRecord]) -> bool {
    if workouts.len() < PLATEAU_WINDOW {
        return false;
    }

    let mut by_date: Vec<&WorkoutRecord> = workouts.iter().collect();
    by_date.sort_by_key(|w| w.date);
    let window: Vec<f64> = by_date[by_date.len() - PLATEAU_WINDOW..]
        .iter()
        .map(|w| w.duration_minutes)
        .collect();

    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    variance < PLATEAU_VARIANCE_THRESHOLD
}

/// Resolve a dot-separated path; numeric segments index into arrays.
fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use modal_kernel::adaptation::ComparisonOperator;
    use modal_kernel::{ModalContext, Platform};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn context() -> ModalAdaptationContext {
        ModalAdaptationContext::new(ModalContext::new("u1", Platform::Web).with_topic("legs"))
    }

    fn check(
        subject: ConditionSubject,
        op: ComparisonOperator,
        value: Value,
        ctx: &ModalAdaptationContext,
    ) -> bool {
        DefaultConditionEvaluator.evaluate(&Condition::new(subject, op, value), ctx, now())
    }

    #[test]
    fn energy_and_recovery() {
        let ctx = context().with_energy(3.0).with_recovery_score(65.0);
        assert!(check(ConditionSubject::EnergyLevel, ComparisonOperator::Lt, json!(4), &ctx));
        assert!(!check(ConditionSubject::EnergyLevel, ComparisonOperator::Gte, json!(4), &ctx));
        assert!(check(ConditionSubject::RecoveryScore, ComparisonOperator::Gt, json!(60), &ctx));
    }

    #[test]
    fn missing_data_is_false() {
        let ctx = context();
        assert!(!check(ConditionSubject::EnergyLevel, ComparisonOperator::Lt, json!(4), &ctx));
        assert!(!check(ConditionSubject::RecoveryScore, ComparisonOperator::Neq, json!(0), &ctx));
        assert!(!check(ConditionSubject::TrainingDelay, ComparisonOperator::Gte, json!(0), &ctx));
    }

    #[test]
    fn training_delay_rounds_up() {
        let workouts = [
            WorkoutRecord::new(now() - Duration::days(9), 40.0),
            WorkoutRecord::new(now() - Duration::days(2) - Duration::hours(3), 45.0),
        ];
        assert_eq!(training_delay_days(&workouts, now()), Some(3));

        let same_moment = [WorkoutRecord::new(now(), 30.0)];
        assert_eq!(training_delay_days(&same_moment, now()), Some(0));

        let future = [WorkoutRecord::new(now() + Duration::days(1), 30.0)];
        assert_eq!(training_delay_days(&future, now()), Some(0));
    }

    #[test]
    fn plateau_needs_four_similar_sessions() {
        let mut ctx = context();
        for (i, minutes) in [45.0, 44.0, 45.0].into_iter().enumerate() {
            let at = now() - Duration::days(i as i64 + 1);
            ctx = ctx.with_workout(WorkoutRecord::new(at, minutes));
        }
        assert!(!is_plateau(&ctx.recent_workouts));

        ctx = ctx.with_workout(WorkoutRecord::new(now() - Duration::days(10), 46.0));
        assert!(is_plateau(&ctx.recent_workouts));
        assert!(check(
            ConditionSubject::PerformancePlateau,
            ComparisonOperator::Eq,
            json!(true),
            &ctx
        ));

        // a much longer session in the newest four breaks the plateau
        ctx = ctx.with_workout(WorkoutRecord::new(now(), 90.0));
        assert!(!is_plateau(&ctx.recent_workouts));
    }

    #[test]
    fn field_paths() {
        let ctx = context()
            .with_user_data("goal", json!("strength"))
            .with_user_data("profile", json!({"age": 41, "injuries": ["knee"]}))
            .with_screen("dashboard");

        let field = |path: &str| ConditionSubject::Field { path: path.into() };
        assert!(check(field("user_data.goal"), ComparisonOperator::Eq, json!("strength"), &ctx));
        assert!(check(field("user_data.profile.age"), ComparisonOperator::Gte, json!(40), &ctx));
        assert!(check(
            field("user_data.profile.injuries.0"),
            ComparisonOperator::Eq,
            json!("knee"),
            &ctx
        ));
        assert!(check(field("current_screen"), ComparisonOperator::Eq, json!("dashboard"), &ctx));
        assert!(check(
            field("modal_context.conversation_topic"),
            ComparisonOperator::Eq,
            json!("legs"),
            &ctx
        ));
        assert!(!check(field("user_data.missing"), ComparisonOperator::Neq, json!(1), &ctx));
    }
}
