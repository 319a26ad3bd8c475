//! Descriptor and context fixtures shared by the integration suites.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use modal_foundation::ModalOrchestrationEngine;
use modal_kernel::{
    Clock, IntensityLevel, ModalAdaptationContext, ModalContext, ModalDescriptor,
    ModalOrchestrationConfig, Platform,
};

/// Strength training: priority 9, category `workout`, high intensity.
pub fn training() -> ModalDescriptor {
    ModalDescriptor::new("training", "Strength Training", "workout")
        .with_version("2.1.0")
        .with_priority(9)
        .with_capability("plan_session")
        .with_trigger("workout|exercise")
        .with_platform(Platform::Mobile)
        .with_intensity(IntensityLevel::High)
        .with_series(4)
        .with_duration_minutes(45)
}

/// Nutrition tracking: priority 8, category `diet`, also reacts to workouts.
pub fn nutrition() -> ModalDescriptor {
    ModalDescriptor::new("nutrition", "Nutrition", "diet")
        .with_priority(8)
        .with_capability("log_meal")
        .with_trigger("meal|macro")
        .with_trigger("workout")
}

/// Mobility routine sharing the `workout` category with [`training`].
pub fn mobility() -> ModalDescriptor {
    ModalDescriptor::new("mobility", "Mobility", "workout")
        .with_priority(4)
        .with_trigger("stretch|workout")
}

/// Meditation, depends on nothing and matches `sleep|stress`.
pub fn mindfulness() -> ModalDescriptor {
    ModalDescriptor::new("mindfulness", "Mindfulness", "wellbeing")
        .with_priority(6)
        .with_trigger("sleep|stress")
}

/// The catalog used by the service suites: the four modals above plus a
/// dependency chain `meal-plan -> nutrition` and a broken cycle.
pub fn catalog() -> Vec<ModalDescriptor> {
    vec![
        training(),
        nutrition(),
        mobility(),
        mindfulness(),
        ModalDescriptor::new("meal-plan", "Meal Plan", "planning")
            .with_priority(5)
            .with_trigger("meal")
            .with_dependency("nutrition"),
        ModalDescriptor::new("loop-a", "Loop A", "x").with_dependency("loop-b"),
        ModalDescriptor::new("loop-b", "Loop B", "x").with_dependency("loop-a"),
    ]
}

pub fn context(topic: &str) -> ModalContext {
    ModalContext::new("athlete-1", Platform::Mobile).with_topic(topic)
}

pub fn adaptation_context(topic: &str) -> ModalAdaptationContext {
    ModalAdaptationContext::new(context(topic))
}

/// 2024-03-04T08:00:00Z
pub fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// An engine with `descriptors` registered in order.
pub fn engine_with(
    config: ModalOrchestrationConfig,
    descriptors: Vec<ModalDescriptor>,
) -> Arc<ModalOrchestrationEngine> {
    let engine = Arc::new(ModalOrchestrationEngine::new(config));
    for descriptor in descriptors {
        let id = descriptor.id.clone();
        assert!(engine.register_modal(descriptor), "fixture {id} failed to register");
    }
    engine
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn starting_at(now_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            now_ms: AtomicU64::new(now_ms),
        })
    }

    pub fn advance_secs(&self, secs: u64) {
        self.now_ms.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
