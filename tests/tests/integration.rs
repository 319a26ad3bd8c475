use std::sync::Arc;

use modal_foundation::{AdaptationEngine, ModalOrchestrationEngine};
use modal_kernel::adaptation::{
    AdaptationAction, AdaptationRule, AdaptationStrategy, ComparisonOperator, Condition,
    ConditionSubject, RuleAction,
};
use modal_kernel::{
    ConflictResolutionMode, ConflictType, IntensityLevel, LifecyclePhase, ModalActivationRequest,
    ModalConfigUpdate, ModalDescriptor, ModalEventKind, ModalOrchestrationConfig, ResourceUsage,
};
use modal_runtime::{ModalInstallRequest, ModalOrchestrationService, ServiceError};
use modal_testing::fixtures::{self, ManualClock};
use modal_testing::{MockExecutor, MockLoader, assert_active, assert_called, assert_event};
use serde_json::json;

fn request(id: &str) -> ModalActivationRequest {
    let usage = ResourceUsage::new(10.0, 5.0, 1.0);
    ModalActivationRequest::new(id, fixtures::context("workout"), usage)
}

fn service_over(
    loader: &MockLoader,
    config: ModalOrchestrationConfig,
) -> ModalOrchestrationService {
    let engine = Arc::new(ModalOrchestrationEngine::new(config));
    ModalOrchestrationService::new(engine, Arc::new(loader.clone()))
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_registry_round_trip_and_uniqueness() {
    let engine = ModalOrchestrationEngine::default();

    assert!(engine.register_modal(fixtures::training()));
    assert!(!engine.register_modal(fixtures::training().with_priority(2)));
    assert_eq!(engine.registered_count(), 1);
    assert_eq!(engine.get_modal("training"), Some(fixtures::training()));

    assert!(engine.unregister_modal("training"));
    assert!(engine.get_modal("training").is_none());
    assert!(!engine.unregister_modal("training"));
    assert_event!(engine, ModalEventKind::ModalUnregistered, "training");

    let phases: Vec<LifecyclePhase> = engine
        .lifecycle_of("training")
        .into_iter()
        .map(|e| e.phase)
        .collect();
    assert_eq!(phases, vec![LifecyclePhase::Initialized, LifecyclePhase::Destroyed]);
}

#[test]
fn test_dependencies_must_be_registered_first() {
    let engine = ModalOrchestrationEngine::default();
    let plan =
        ModalDescriptor::new("meal-plan", "Meal Plan", "planning").with_dependency("nutrition");

    assert!(!engine.register_modal(plan.clone()));
    assert_event!(engine, ModalEventKind::ModalError, "meal-plan");

    assert!(engine.register_modal(fixtures::nutrition()));
    assert!(engine.register_modal(plan));
}

#[test]
fn test_compatible_modals_training_before_nutrition() {
    let engine = fixtures::engine_with(
        ModalOrchestrationConfig::default(),
        vec![fixtures::nutrition(), fixtures::training(), fixtures::mindfulness()],
    );

    let compatible = engine.get_compatible_modals(&fixtures::context("leg day workout"));
    assert_eq!(compatible, vec!["training", "nutrition"]);

    assert!(engine.get_compatible_modals(&fixtures::context("tax return")).is_empty());
}

// ============================================================================
// Activation
// ============================================================================

#[test]
fn test_activation_is_idempotent() {
    let engine =
        fixtures::engine_with(ModalOrchestrationConfig::default(), vec![fixtures::training()]);

    let first = engine.activate_modal(request("training"));
    let second = engine.activate_modal(request("training"));

    assert!(first.success && second.success);
    assert_active!(engine, ["training"]);
    assert_eq!(engine.events_of_kind(ModalEventKind::ModalActivated).len(), 1);
    assert_eq!(engine.get_metrics("training").unwrap().activation_count, 1);
}

#[test]
fn test_admission_respects_ceiling() {
    // ceiling = 15 MB / 10 % / 2 KB/s
    let config = ModalOrchestrationConfig::default()
        .with_limits(15.0, 10.0, 2.0)
        .with_max_concurrent_modals(1);
    let engine = fixtures::engine_with(config, vec![fixtures::training(), fixtures::nutrition()]);

    assert!(engine.activate_modal(request("training")).success);

    let refused = engine.activate_modal(request("nutrition"));
    assert!(!refused.success);
    assert_eq!(refused.error_message.as_deref(), Some("Insufficient resources"));
    assert_active!(engine, ["training"]);
    assert_event!(engine, ModalEventKind::ResourceLimitExceeded, "nutrition");

    assert!(engine.deactivate_modal("training"));
    assert!(engine.activate_modal(request("nutrition")).success);
}

#[test]
fn test_same_category_activation_records_resolved_conflict() {
    let engine = fixtures::engine_with(
        ModalOrchestrationConfig::default(),
        vec![fixtures::training(), fixtures::mobility()],
    );

    assert!(engine.activate_modal(request("training")).success);
    let response = engine.activate_modal(request("mobility"));
    assert!(response.success);
    assert_active!(engine, ["training", "mobility"]);

    let conflicts = engine.conflict_history();
    assert_eq!(conflicts.len(), 1);
    let conflict = &conflicts[0];
    assert_eq!(conflict.modal_ids, vec!["mobility", "training"]);
    assert_eq!(conflict.conflict_type, ConflictType::Resource);
    assert!(conflict.resolved);
    assert_event!(engine, ModalEventKind::ConflictDetected, "mobility");
}

#[test]
fn test_evict_mode_replaces_outranked_modal() {
    let config = ModalOrchestrationConfig::default()
        .with_conflict_mode(ConflictResolutionMode::EvictLowerPriority);
    let engine = fixtures::engine_with(config, vec![fixtures::training(), fixtures::mobility()]);

    assert!(engine.activate_modal(request("mobility")).success);
    assert!(engine.activate_modal(request("training")).success);
    assert_active!(engine, ["training"]);
    assert_event!(engine, ModalEventKind::ModalDeactivated, "mobility");

    // the outranked modal cannot come back
    assert!(!engine.activate_modal(request("mobility")).success);
    assert_active!(engine, ["training"]);
}

#[test]
fn test_deny_mode_refuses_lower_priority_candidate() {
    let config = ModalOrchestrationConfig::default()
        .with_conflict_mode(ConflictResolutionMode::DenyLowerPriority);
    let engine = fixtures::engine_with(config, vec![fixtures::training(), fixtures::mobility()]);

    assert!(engine.activate_modal(request("training")).success);
    let refused = engine.activate_modal(request("mobility"));
    assert!(!refused.success);
    assert_active!(engine, ["training"]);
    assert!(engine.conflict_history().iter().all(|c| !c.resolved));
}

#[tokio::test]
async fn test_subscribers_see_activation_events() {
    let engine =
        fixtures::engine_with(ModalOrchestrationConfig::default(), vec![fixtures::training()]);
    let mut events = engine.subscribe();

    engine.activate_modal(request("training"));

    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, ModalEventKind::ModalActivated);
    assert_eq!(event.modal_id.as_deref(), Some("training"));
}

// ============================================================================
// Messaging and configuration
// ============================================================================

#[test]
fn test_message_log_is_bounded_by_history_limit() {
    let engine = fixtures::engine_with(
        ModalOrchestrationConfig::default(),
        vec![fixtures::training(), fixtures::nutrition()],
    );
    engine.update_config(ModalConfigUpdate {
        history_limit: Some(3),
        ..Default::default()
    });

    for i in 0..5 {
        assert!(engine.send_cross_modal_message(
            "training",
            "nutrition",
            &format!("m{i}"),
            json!({"kcal": 500}),
            false
        ));
    }
    assert!(!engine.send_cross_modal_message("training", "ghost", "lost", json!(null), true));

    let log: Vec<String> = engine.communication_log().into_iter().map(|m| m.message).collect();
    assert_eq!(log, vec!["m2", "m3", "m4"]);
    assert_eq!(engine.get_analytics().messages_sent, 5);
}

#[test]
fn test_partial_config_update_keeps_other_fields() {
    let engine = ModalOrchestrationEngine::default();
    let before = engine.config();

    engine.update_config(ModalConfigUpdate {
        max_concurrent_modals: Some(2),
        ..Default::default()
    });

    let after = engine.config();
    assert_eq!(after.max_concurrent_modals, 2);
    assert_eq!(after.memory_limit_per_modal, before.memory_limit_per_modal);
    assert_eq!(after.cache_ttl_secs, before.cache_ttl_secs);
    assert_eq!(after.conflict_resolution_mode, before.conflict_resolution_mode);
    assert_eq!(engine.events_of_kind(ModalEventKind::ConfigUpdated).len(), 1);
}

#[test]
fn test_config_file_loading() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("orchestration.yml");
    std::fs::write(
        &path,
        concat!(
            "max_concurrent_modals: 3\n",
            "conflict_resolution_mode: evict_lower_priority\n",
            "preload_strategies: [training]\n",
        ),
    )
    .unwrap();
    let path = path.to_str().unwrap();

    let config = modal_kernel::config::load_orchestration_config(path).unwrap();
    assert_eq!(config.max_concurrent_modals, 3);
    assert_eq!(config.conflict_resolution_mode, ConflictResolutionMode::EvictLowerPriority);
    assert_eq!(config.preload_strategies, vec!["training"]);
    assert_eq!(config.cache_ttl_secs, 300);

    let loader = Arc::new(MockLoader::new(fixtures::catalog()));
    let service = ModalOrchestrationService::from_config_file(path, loader).unwrap();
    assert_eq!(service.engine().config().max_concurrent_modals, 3);
}

// ============================================================================
// Adaptation
// ============================================================================

#[test]
fn test_low_energy_drops_training_to_medium() {
    let engine =
        fixtures::engine_with(ModalOrchestrationConfig::default(), vec![fixtures::training()]);
    let adaptation = AdaptationEngine::with_default_rules(engine.clone());

    let adapted = adaptation
        .adapt_modal("training", &fixtures::adaptation_context("workout").with_energy(3.0))
        .unwrap();

    assert_eq!(adapted.modal.metadata.adaptable.intensity_level, Some(IntensityLevel::Medium));
    assert!(adapted.explanation.contains("Energy is low today"));
    assert!(adapted.explanation.contains("from high to medium"));
    assert_eq!(
        engine.get_modal("training").unwrap().metadata.adaptable.intensity_level,
        Some(IntensityLevel::High)
    );
    assert_event!(engine, ModalEventKind::ModalAdapted, "training");
}

#[test]
fn test_full_intensity_cut_clamps_at_very_low() {
    let engine =
        fixtures::engine_with(ModalOrchestrationConfig::default(), vec![fixtures::training()]);
    let adaptation = AdaptationEngine::new(engine);
    adaptation
        .add_rule(
            AdaptationRule::new("rest_day", AdaptationStrategy::EnergyBased)
                .when(Condition::new(ConditionSubject::EnergyLevel, ComparisonOperator::Lte, 2))
                .then(RuleAction::new(AdaptationAction::AdjustIntensity { percentage: -100.0 })),
        )
        .unwrap();

    let adapted = adaptation
        .adapt_modal("training", &fixtures::adaptation_context("workout").with_energy(1.0))
        .unwrap();
    assert_eq!(adapted.modal.metadata.adaptable.intensity_level, Some(IntensityLevel::VeryLow));
}

#[test]
fn test_rested_context_leaves_modals_untouched() {
    let engine =
        fixtures::engine_with(ModalOrchestrationConfig::default(), vec![fixtures::training()]);
    let adaptation = AdaptationEngine::with_default_rules(engine);

    let context = fixtures::adaptation_context("workout")
        .with_energy(6.0)
        .with_recovery_score(60.0);
    assert!(adaptation.adapt_modal("training", &context).is_none());
    assert!(adaptation.adapt_compatible_modals(&context).is_empty());
}

// ============================================================================
// Service
// ============================================================================

#[tokio::test]
async fn test_install_resolves_dependencies_transitively() {
    let loader = MockLoader::new(fixtures::catalog());
    let service = service_over(&loader, ModalOrchestrationConfig::default());

    let outcome = service.install_modal(ModalInstallRequest::new("meal-plan")).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.installed_dependencies, vec!["nutrition"]);
    assert_eq!(loader.history().await, vec!["meal-plan", "nutrition"]);

    let ids: Vec<String> = service.engine().get_registry().into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec!["nutrition", "meal-plan"]);
}

#[tokio::test]
async fn test_install_detects_cycles() {
    let loader = MockLoader::new(fixtures::catalog());
    let service = service_over(&loader, ModalOrchestrationConfig::default());

    let outcome = service.install_modal(ModalInstallRequest::new("loop-a")).await.unwrap();
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("loop-a -> loop-b -> loop-a"));
    assert_eq!(service.engine().registered_count(), 0);
}

#[tokio::test]
async fn test_loader_outage_is_an_error() {
    let loader = MockLoader::new(fixtures::catalog());
    loader.go_offline("maintenance").await;
    let service = service_over(&loader, ModalOrchestrationConfig::default());

    let report = service.install_modal(ModalInstallRequest::new("training")).await.unwrap_err();
    assert!(matches!(report.current_context(), ServiceError::Loader(_)));
}

#[tokio::test]
async fn test_descriptor_cache_expires_after_ttl() {
    let loader = MockLoader::new(fixtures::catalog());
    let clock = ManualClock::starting_at(1_000);
    let config = ModalOrchestrationConfig {
        cache_ttl_secs: 60,
        ..Default::default()
    };
    let engine = Arc::new(ModalOrchestrationEngine::with_clock(config, clock.clone()));
    let service = ModalOrchestrationService::new(engine, Arc::new(loader.clone()));

    service.install_modal(ModalInstallRequest::new("training")).await.unwrap();
    assert_called!(loader, 1);

    clock.advance_secs(30);
    service.engine().unregister_modal("training");
    service.install_modal(ModalInstallRequest::new("training")).await.unwrap();
    assert_called!(loader, 1);

    clock.advance_secs(31);
    service.engine().unregister_modal("training");
    service.install_modal(ModalInstallRequest::new("training")).await.unwrap();
    assert_called!(loader, 2);
}

#[tokio::test]
async fn test_execute_runs_executor_and_records_metrics() {
    let loader = MockLoader::new(fixtures::catalog());
    let executor = MockExecutor::new();
    executor.set_result("training", json!({"plan": "5x5"})).await;
    let service = service_over(&loader, ModalOrchestrationConfig::default())
        .with_executor(Arc::new(executor.clone()));

    let output = service
        .execute_modal("training", fixtures::context("workout"), json!({"day": "monday"}))
        .await
        .unwrap();

    assert_eq!(output, json!({"plan": "5x5"}));
    assert_called!(executor, 1);
    assert_eq!(executor.history().await[0].user_id, "athlete-1");
    assert_active!(service.engine(), ["training"]);
    assert_eq!(service.engine().get_metrics("training").unwrap().execution_count, 1);
}

#[tokio::test]
async fn test_executor_errors_propagate() {
    let loader = MockLoader::new(fixtures::catalog());
    let executor = MockExecutor::new();
    executor.set_failure("nutrition", "food database unreachable").await;
    let service = service_over(&loader, ModalOrchestrationConfig::default())
        .with_executor(Arc::new(executor.clone()));

    let report = service
        .execute_modal("nutrition", fixtures::context("meal"), json!({}))
        .await
        .unwrap_err();

    assert!(matches!(report.current_context(), ServiceError::Execution(_)));
    assert!(report.current_context().to_string().contains("food database unreachable"));
    assert_eq!(executor.calls_for("nutrition").await, 1);
    assert_eq!(service.engine().get_metrics("nutrition").unwrap().error_rate, 1.0);
}

#[tokio::test]
async fn test_orchestrate_activates_in_priority_order() {
    let loader = MockLoader::new(fixtures::catalog());
    let service = service_over(&loader, ModalOrchestrationConfig::default());
    for id in ["mobility", "nutrition", "training"] {
        service.install_modal(ModalInstallRequest::new(id)).await.unwrap();
    }

    let responses = service.orchestrate(&fixtures::context("workout"));

    assert_eq!(responses.len(), 3);
    assert!(responses.iter().all(|r| r.success));
    assert_active!(service.engine(), ["training", "nutrition", "mobility"]);
    // mobility shares the workout category with training
    assert_eq!(service.engine().get_analytics().conflicts_detected, 1);
}
