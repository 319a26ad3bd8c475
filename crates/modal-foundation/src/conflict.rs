//! Same-category conflict detection and resolution.

use modal_kernel::{
    ConflictResolutionMode, ConflictType, ModalConflict, ModalDescriptor, ResolutionStrategy,
};

/// Result of checking one activation candidate against the active set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictAssessment {
    /// One record per active modal sharing the candidate's category.
    pub conflicts: Vec<ModalConflict>,
    /// Active modals the candidate displaces when admitted.
    pub evictions: Vec<String>,
}

impl ConflictAssessment {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Activation proceeds only when every conflict was resolved.
    pub fn all_resolved(&self) -> bool {
        self.conflicts.iter().all(|c| c.resolved)
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &ModalConflict> {
        self.conflicts.iter().filter(|c| !c.resolved)
    }
}

/// Detects resource conflicts and settles them according to the configured
/// strategy and mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver {
    strategy: ResolutionStrategy,
    mode: ConflictResolutionMode,
}

impl ConflictResolver {
    pub fn new(strategy: ResolutionStrategy, mode: ConflictResolutionMode) -> Self {
        Self { strategy, mode }
    }

    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    pub fn mode(&self) -> ConflictResolutionMode {
        self.mode
    }

    /// Compare `candidate` with every active descriptor. A candidate never
    /// conflicts with itself.
    pub fn assess<'a, I>(
        &self,
        candidate: &ModalDescriptor,
        active: I,
        now_ms: u64,
    ) -> ConflictAssessment
    where
        I: IntoIterator<Item = &'a ModalDescriptor>,
    {
        let mut assessment = ConflictAssessment::default();

        for incumbent in active {
            if incumbent.id == candidate.id || incumbent.category != candidate.category {
                continue;
            }

            let (resolved, resolution, evict) = self.resolve(candidate, incumbent);
            if evict {
                assessment.evictions.push(incumbent.id.clone());
            }

            assessment.conflicts.push(ModalConflict {
                modal_ids: vec![candidate.id.clone(), incumbent.id.clone()],
                conflict_type: ConflictType::Resource,
                resolution_strategy: self.strategy,
                resolved,
                resolution,
                timestamp_ms: now_ms,
            });
        }

        assessment
    }

    fn resolve(
        &self,
        candidate: &ModalDescriptor,
        incumbent: &ModalDescriptor,
    ) -> (bool, Option<String>, bool) {
        if self.strategy != ResolutionStrategy::Priority {
            // consensus / user_choice / defer need a decision from outside the engine
            return (false, None, false);
        }

        let outranks = candidate.priority > incumbent.priority;
        match self.mode {
            ConflictResolutionMode::AdmitAll => {
                let note = if outranks {
                    format!(
                        "{} (priority {}) outranks {} (priority {}); both kept active",
                        candidate.id, candidate.priority, incumbent.id, incumbent.priority
                    )
                } else {
                    format!(
                        "{} (priority {}) keeps precedence over {} (priority {}); both kept active",
                        incumbent.id, incumbent.priority, candidate.id, candidate.priority
                    )
                };
                (true, Some(note), false)
            }
            ConflictResolutionMode::DenyLowerPriority if outranks => (
                true,
                Some(format!("{} outranks {}", candidate.id, incumbent.id)),
                false,
            ),
            ConflictResolutionMode::EvictLowerPriority if outranks => (
                true,
                Some(format!("{} evicts {}", candidate.id, incumbent.id)),
                true,
            ),
            ConflictResolutionMode::DenyLowerPriority
            | ConflictResolutionMode::EvictLowerPriority => (false, None, false),
        }
    }
}
