//! Modal descriptors
//!
//! A [`ModalDescriptor`] is the immutable catalog entry for one pluggable
//! feature unit (training, nutrition, recovery, ...). Descriptors are pure
//! data; the engine owns the registry they are stored in.

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{ModalError, ModalResult};

/// Lowest accepted descriptor priority.
pub const MIN_PRIORITY: u8 = 1;
/// Highest accepted descriptor priority.
pub const MAX_PRIORITY: u8 = 10;

// ============================================================================
// Enumerations
// ============================================================================

/// Platforms a modal can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Platform {
    Web,
    Mobile,
    Desktop,
}

/// How a modal is wired into the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum IntegrationType {
    /// Compiled into the host.
    #[default]
    Native,
    /// Rendered inside another modal's surface.
    Embedded,
    /// Backed by an external service.
    External,
}

/// Five-level ordinal intensity scale used by training-style modals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl IntensityLevel {
    /// All levels, lowest first.
    pub const SCALE: [IntensityLevel; 5] = [
        IntensityLevel::VeryLow,
        IntensityLevel::Low,
        IntensityLevel::Medium,
        IntensityLevel::High,
        IntensityLevel::VeryHigh,
    ];

    /// Position on the scale (0 = very low).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Move `steps` levels up (positive) or down (negative), clamped to the scale.
    pub fn shifted(self, steps: i64) -> Self {
        let max = (Self::SCALE.len() - 1) as i64;
        let target = (self.index() as i64 + steps).clamp(0, max);
        Self::SCALE[target as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very_low",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

impl std::fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// The only part of a descriptor the adaptation layer touches, and only on
/// cloned copies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdaptableSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_level: Option<IntensityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
    /// Alternative variant selected by a `suggest_alternative` action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative: Option<String>,
}

/// Descriptive metadata attached to a modal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModalMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Host versions or sibling modals this modal is known to work with.
    #[serde(default)]
    pub compatibility: Vec<String>,
    #[serde(default)]
    pub integration_type: IntegrationType,
    #[serde(default)]
    pub adaptable: AdaptableSettings,
}

// ============================================================================
// ModalDescriptor
// ============================================================================

/// Catalog entry for one modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalDescriptor {
    /// Unique registry key
    pub id: String,
    pub name: String,
    pub version: String,
    /// Free-form category; two active modals sharing one are in conflict
    pub category: String,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    /// Modals that must already be registered
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 1 (lowest) to 10 (highest)
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Case-insensitive regular expressions matched against the context
    #[serde(default)]
    pub activation_triggers: Vec<String>,
    #[serde(default)]
    pub required_permissions: BTreeSet<String>,
    #[serde(default)]
    pub supported_platforms: BTreeSet<Platform>,
    #[serde(default)]
    pub metadata: ModalMetadata,
}

fn default_true() -> bool {
    true
}

fn default_priority() -> u8 {
    5
}

impl ModalDescriptor {
    pub fn new(id: &str, name: &str, category: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            version: "1.0.0".to_string(),
            category: category.to_string(),
            capabilities: BTreeSet::new(),
            dependencies: Vec::new(),
            enabled: true,
            priority: default_priority(),
            activation_triggers: Vec::new(),
            required_permissions: BTreeSet::new(),
            supported_platforms: BTreeSet::new(),
            metadata: ModalMetadata::default(),
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_capability(mut self, capability: &str) -> Self {
        self.capabilities.insert(capability.to_string());
        self
    }

    pub fn with_dependency(mut self, dependency: &str) -> Self {
        self.dependencies.push(dependency.to_string());
        self
    }

    pub fn with_trigger(mut self, pattern: &str) -> Self {
        self.activation_triggers.push(pattern.to_string());
        self
    }

    pub fn with_permission(mut self, permission: &str) -> Self {
        self.required_permissions.insert(permission.to_string());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.supported_platforms.insert(platform);
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.metadata.author = Some(author.to_string());
        self
    }

    pub fn with_intensity(mut self, level: IntensityLevel) -> Self {
        self.metadata.adaptable.intensity_level = Some(level);
        self
    }

    pub fn with_series(mut self, series: u32) -> Self {
        self.metadata.adaptable.series = Some(series);
        self
    }

    pub fn with_duration_minutes(mut self, minutes: u32) -> Self {
        self.metadata.adaptable.duration_minutes = Some(minutes);
        self
    }

    pub fn with_scheduled_time(mut self, at: DateTime<Utc>) -> Self {
        self.metadata.adaptable.scheduled_time = Some(at);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Structural validation that needs no registry: required fields and the
    /// priority range. Uniqueness and dependency checks are the registry's job.
    pub fn validate(&self) -> ModalResult<()> {
        if self.id.trim().is_empty() {
            return Err(ModalError::MissingField("id"));
        }
        if self.name.trim().is_empty() {
            return Err(ModalError::MissingField("name"));
        }
        if self.version.trim().is_empty() {
            return Err(ModalError::MissingField("version"));
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.priority) {
            return Err(ModalError::InvalidPriority {
                modal_id: self.id.clone(),
                priority: self.priority,
            });
        }
        Ok(())
    }

    /// Whether the modal declares support for `platform`. An empty platform
    /// set means "all platforms".
    pub fn supports(&self, platform: Platform) -> bool {
        self.supported_platforms.is_empty() || self.supported_platforms.contains(&platform)
    }
}

// ============================================================================
// Trigger matching
// ============================================================================

enum CompiledTrigger {
    Pattern(Regex),
    /// Fallback for strings that are not valid regular expressions.
    Literal(String),
}

/// Pre-compiled activation triggers of one modal.
///
/// Every trigger is a case-insensitive regular expression. A trigger that
/// fails to compile is matched as a case-insensitive literal substring.
pub struct TriggerMatcher {
    triggers: Vec<CompiledTrigger>,
}

impl TriggerMatcher {
    pub fn compile(patterns: &[String]) -> Self {
        let triggers = patterns
            .iter()
            .map(|pattern| {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(re) => CompiledTrigger::Pattern(re),
                    Err(e) => {
                        tracing::debug!(
                            pattern = %pattern,
                            error = %e,
                            "trigger is not a regex, matching literally"
                        );
                        CompiledTrigger::Literal(pattern.to_lowercase())
                    }
                }
            })
            .collect();
        Self { triggers }
    }

    /// Whether any trigger hits any candidate. Stops at the first hit.
    pub fn matches_any<'a, I>(&self, candidates: I) -> bool
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        self.triggers.iter().any(|trigger| {
            candidates.clone().into_iter().any(|text| match trigger {
                CompiledTrigger::Pattern(re) => re.is_match(text),
                CompiledTrigger::Literal(lit) => text.to_lowercase().contains(lit.as_str()),
            })
        })
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

impl std::fmt::Debug for TriggerMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerMatcher")
            .field("triggers", &self.triggers.len())
            .finish()
    }
}
