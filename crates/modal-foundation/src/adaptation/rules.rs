//! Stock adaptation rules.

use modal_kernel::adaptation::{
    AdaptationAction, AdaptationRule, AdaptationStrategy, ComparisonOperator, Condition,
    ConditionSubject, RuleAction,
};

pub const LOW_ENERGY_RULE: &str = "low_energy";
pub const POOR_RECOVERY_RULE: &str = "poor_recovery";
pub const EXHAUSTED_RULE: &str = "exhausted";
pub const LONG_BREAK_RULE: &str = "long_break";
pub const HIGH_READINESS_RULE: &str = "high_readiness";
pub const PLATEAU_RULE: &str = "performance_plateau";

/// The rule set installed by `AdaptationEngine::with_default_rules`.
pub fn default_rules() -> Vec<AdaptationRule> {
    vec![
        AdaptationRule::new(LOW_ENERGY_RULE, AdaptationStrategy::EnergyBased)
            .with_name("Low energy")
            .with_priority(10)
            .when(Condition::new(
                ConditionSubject::EnergyLevel,
                ComparisonOperator::Lt,
                4,
            ))
            .then(
                RuleAction::new(AdaptationAction::AdjustIntensity { percentage: -25.0 })
                    .with_explanation(
                        "Energy is low today, so {modal} intensity goes from {old} to {new}.",
                    )
                    .with_confidence(0.85),
            ),
        AdaptationRule::new(EXHAUSTED_RULE, AdaptationStrategy::ScheduleBased)
            .with_name("Exhausted")
            .with_priority(9)
            .when(Condition::new(
                ConditionSubject::RecoveryScore,
                ComparisonOperator::Lt,
                30,
            ))
            .then(
                RuleAction::new(AdaptationAction::RescheduleSession { hours: 24 })
                    .with_explanation("Recovery is very low; {modal} moves to tomorrow.")
                    .with_confidence(0.9),
            ),
        AdaptationRule::new(POOR_RECOVERY_RULE, AdaptationStrategy::PerformanceBased)
            .with_name("Poor recovery")
            .with_priority(8)
            .when(Condition::new(
                ConditionSubject::RecoveryScore,
                ComparisonOperator::Lt,
                50,
            ))
            .then(
                RuleAction::new(AdaptationAction::ModifySeries { percentage: -30.0 })
                    .with_explanation(
                        "Recovery is incomplete, {modal} series drop from {old} to {new}.",
                    ),
            )
            .then(RuleAction::new(AdaptationAction::ChangeDuration { minutes: -10 })),
        AdaptationRule::new(LONG_BREAK_RULE, AdaptationStrategy::ScheduleBased)
            .with_name("Returning after a break")
            .with_priority(7)
            .when(Condition::new(
                ConditionSubject::TrainingDelay,
                ComparisonOperator::Gte,
                7,
            ))
            .then(
                RuleAction::new(AdaptationAction::AdjustIntensity { percentage: -40.0 })
                    .with_explanation("It has been a while; {modal} eases in at {new} intensity."),
            )
            .then(RuleAction::new(AdaptationAction::ModifySeries { percentage: -25.0 })),
        AdaptationRule::new(HIGH_READINESS_RULE, AdaptationStrategy::EnergyBased)
            .with_name("High readiness")
            .with_priority(5)
            .when(Condition::new(
                ConditionSubject::EnergyLevel,
                ComparisonOperator::Gte,
                8,
            ))
            .when(Condition::new(
                ConditionSubject::RecoveryScore,
                ComparisonOperator::Gte,
                70,
            ))
            .then(
                RuleAction::new(AdaptationAction::AdjustIntensity { percentage: 20.0 })
                    .with_explanation("You are well recovered: {modal} intensity rises to {new}.")
                    .with_confidence(0.7),
            ),
        AdaptationRule::new(PLATEAU_RULE, AdaptationStrategy::PerformanceBased)
            .with_name("Performance plateau")
            .with_priority(4)
            .when(Condition::new(
                ConditionSubject::PerformancePlateau,
                ComparisonOperator::Eq,
                true,
            ))
            .then(
                RuleAction::new(AdaptationAction::ModifySeries { percentage: 20.0 })
                    .with_explanation(
                        "Progress has stalled; {modal} adds volume ({old} to {new} series).",
                    )
                    .with_confidence(0.6),
            ),
    ]
}
