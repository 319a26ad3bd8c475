//! Default action application.

use chrono::{DateTime, TimeDelta, Utc};
use modal_kernel::adaptation::{ActionApplier, AdaptationAction, AppliedChange};
use modal_kernel::{IntensityLevel, ModalDescriptor};
use serde_json::Value;

/// Baseline assumed when an adaptable field is unset.
pub const DEFAULT_INTENSITY: IntensityLevel = IntensityLevel::Medium;
pub const DEFAULT_SERIES: u32 = 3;
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Floors applied after a change.
pub const MIN_SERIES: u32 = 1;
pub const MIN_DURATION_MINUTES: u32 = 5;

/// One intensity step per this many percent.
const PERCENT_PER_INTENSITY_STEP: f64 = 20.0;

/// Mutates `metadata.adaptable` of the cloned descriptor (and its name for
/// `suggest_alternative`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultActionApplier;

impl ActionApplier for DefaultActionApplier {
    fn apply(
        &self,
        action: &AdaptationAction,
        modal: &mut ModalDescriptor,
        now: DateTime<Utc>,
    ) -> AppliedChange {
        let adaptable = &mut modal.metadata.adaptable;

        match action {
            AdaptationAction::AdjustIntensity { percentage } => {
                let old = adaptable.intensity_level.unwrap_or(DEFAULT_INTENSITY);
                let steps = (percentage / PERCENT_PER_INTENSITY_STEP).round() as i64;
                let new = old.shifted(steps);
                adaptable.intensity_level = Some(new);
                change(
                    Value::from(old.as_str()),
                    Value::from(new.as_str()),
                    format!("Intensity adjusted from {old} to {new}."),
                )
            }
            AdaptationAction::ModifySeries { percentage } => {
                let old = adaptable.series.unwrap_or(DEFAULT_SERIES);
                let scaled = (old as f64 * (1.0 + percentage / 100.0)).round();
                let new = (scaled.max(0.0) as u32).max(MIN_SERIES);
                adaptable.series = Some(new);
                change(
                    Value::from(old),
                    Value::from(new),
                    format!("Series changed from {old} to {new}."),
                )
            }
            AdaptationAction::ChangeDuration { minutes } => {
                let old = adaptable.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
                let new = i64::from(old)
                    .saturating_add(*minutes)
                    .clamp(i64::from(MIN_DURATION_MINUTES), i64::from(u32::MAX))
                    as u32;
                adaptable.duration_minutes = Some(new);
                change(
                    Value::from(old),
                    Value::from(new),
                    format!("Duration changed from {old} to {new} minutes."),
                )
            }
            AdaptationAction::RescheduleSession { hours } => {
                let old = adaptable.scheduled_time.unwrap_or(now);
                let moved = TimeDelta::try_hours(*hours).and_then(|d| old.checked_add_signed(d));
                let Some(new) = moved else {
                    return change(
                        Value::from(old.to_rfc3339()),
                        Value::from(old.to_rfc3339()),
                        format!("Session not moved: {hours} hours is out of range."),
                    );
                };
                adaptable.scheduled_time = Some(new);
                change(
                    Value::from(old.to_rfc3339()),
                    Value::from(new.to_rfc3339()),
                    format!("Session moved by {hours} hours."),
                )
            }
            AdaptationAction::SuggestAlternative { alternative } => {
                let old = std::mem::replace(&mut modal.name, alternative.clone());
                modal.metadata.adaptable.alternative = Some(alternative.clone());
                change(
                    Value::from(old.clone()),
                    Value::from(alternative.as_str()),
                    format!("Suggested {alternative} instead of {old}."),
                )
            }
        }
    }
}

fn change(old_value: Value, new_value: Value, default_explanation: String) -> AppliedChange {
    AppliedChange {
        old_value,
        new_value,
        default_explanation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap()
    }

    fn modal() -> ModalDescriptor {
        ModalDescriptor::new("training", "Strength Block", "workout")
    }

    fn apply(action: AdaptationAction, modal: &mut ModalDescriptor) -> AppliedChange {
        DefaultActionApplier.apply(&action, modal, now())
    }

    #[test]
    fn intensity_moves_in_twenty_percent_steps() {
        let mut m = modal().with_intensity(IntensityLevel::High);
        let change = apply(AdaptationAction::AdjustIntensity { percentage: -25.0 }, &mut m);
        assert_eq!(m.metadata.adaptable.intensity_level, Some(IntensityLevel::Medium));
        assert_eq!(change.old_value, json!("high"));
        assert_eq!(change.new_value, json!("medium"));

        let mut m = modal().with_intensity(IntensityLevel::High);
        apply(AdaptationAction::AdjustIntensity { percentage: -100.0 }, &mut m);
        assert_eq!(m.metadata.adaptable.intensity_level, Some(IntensityLevel::VeryLow));

        let mut m = modal();
        apply(AdaptationAction::AdjustIntensity { percentage: 45.0 }, &mut m);
        assert_eq!(m.metadata.adaptable.intensity_level, Some(IntensityLevel::VeryHigh));
    }

    #[test]
    fn series_never_drops_below_one() {
        let mut m = modal().with_series(4);
        apply(AdaptationAction::ModifySeries { percentage: -30.0 }, &mut m);
        assert_eq!(m.metadata.adaptable.series, Some(3));

        let mut m = modal().with_series(2);
        apply(AdaptationAction::ModifySeries { percentage: -100.0 }, &mut m);
        assert_eq!(m.metadata.adaptable.series, Some(1));

        let mut m = modal();
        let change = apply(AdaptationAction::ModifySeries { percentage: 50.0 }, &mut m);
        assert_eq!(change.old_value, json!(3));
        assert_eq!(m.metadata.adaptable.series, Some(5));
    }

    #[test]
    fn duration_floor_is_five_minutes() {
        let mut m = modal().with_duration_minutes(20);
        apply(AdaptationAction::ChangeDuration { minutes: -30 }, &mut m);
        assert_eq!(m.metadata.adaptable.duration_minutes, Some(5));

        let mut m = modal();
        apply(AdaptationAction::ChangeDuration { minutes: 15 }, &mut m);
        assert_eq!(m.metadata.adaptable.duration_minutes, Some(45));
    }

    #[test]
    fn reschedule_defaults_to_now() {
        let mut m = modal();
        let change = apply(AdaptationAction::RescheduleSession { hours: 24 }, &mut m);
        assert_eq!(m.metadata.adaptable.scheduled_time, Some(now() + Duration::hours(24)));
        assert_eq!(change.old_value, json!(now().to_rfc3339()));

        let planned = now() + Duration::hours(3);
        let mut m = modal().with_scheduled_time(planned);
        apply(AdaptationAction::RescheduleSession { hours: 48 }, &mut m);
        assert_eq!(m.metadata.adaptable.scheduled_time, Some(planned + Duration::hours(48)));
    }

    #[test]
    fn duration_saturates_on_extreme_offsets() {
        let mut m = modal().with_duration_minutes(20);
        apply(AdaptationAction::ChangeDuration { minutes: i64::MAX }, &mut m);
        assert_eq!(m.metadata.adaptable.duration_minutes, Some(u32::MAX));

        let mut m = modal().with_duration_minutes(20);
        apply(AdaptationAction::ChangeDuration { minutes: i64::MIN }, &mut m);
        assert_eq!(m.metadata.adaptable.duration_minutes, Some(MIN_DURATION_MINUTES));
    }

    #[test]
    fn out_of_range_reschedule_leaves_time_unchanged() {
        let planned = now() + Duration::hours(3);
        let mut m = modal().with_scheduled_time(planned);
        let change = apply(AdaptationAction::RescheduleSession { hours: i64::MAX }, &mut m);
        assert_eq!(m.metadata.adaptable.scheduled_time, Some(planned));
        assert_eq!(change.old_value, change.new_value);
        assert!(change.default_explanation.contains("out of range"));

        let mut m = modal();
        apply(AdaptationAction::RescheduleSession { hours: i64::MIN }, &mut m);
        assert_eq!(m.metadata.adaptable.scheduled_time, None);
    }

    #[test]
    fn alternative_relabels_the_copy() {
        let mut m = modal();
        let change = apply(
            AdaptationAction::SuggestAlternative { alternative: "Mobility Flow".into() },
            &mut m,
        );
        assert_eq!(m.name, "Mobility Flow");
        assert_eq!(m.metadata.adaptable.alternative.as_deref(), Some("Mobility Flow"));
        assert_eq!(change.old_value, json!("Strength Block"));
    }
}
