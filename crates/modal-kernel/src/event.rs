//! Engine events, lifecycle records and cross-modal messages.
//!
//! Everything here is append-only log material. The engine keeps bounded
//! histories of each record type and fans [`ModalEvent`]s out to subscribers.

use serde::{Deserialize, Serialize};

/// Event kinds emitted by the orchestration engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ModalEventKind {
    ModalRegistered,
    ModalUnregistered,
    ModalActivated,
    ModalDeactivated,
    ResourceLimitExceeded,
    ConflictDetected,
    ModalError,
    ModalAdapted,
    ConfigUpdated,
}

impl ModalEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ModalRegistered => "modal_registered",
            Self::ModalUnregistered => "modal_unregistered",
            Self::ModalActivated => "modal_activated",
            Self::ModalDeactivated => "modal_deactivated",
            Self::ResourceLimitExceeded => "resource_limit_exceeded",
            Self::ConflictDetected => "conflict_detected",
            Self::ModalError => "modal_error",
            Self::ModalAdapted => "modal_adapted",
            Self::ConfigUpdated => "config_updated",
        }
    }
}

impl std::fmt::Display for ModalEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Info,
    Warning,
    Error,
}

/// A structured engine event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalEvent {
    pub event_id: String,
    pub kind: ModalEventKind,
    pub severity: EventSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modal_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub timestamp_ms: u64,
}

impl ModalEvent {
    pub fn new(kind: ModalEventKind, severity: EventSeverity, message: impl Into<String>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            kind,
            severity,
            modal_id: None,
            message: message.into(),
            data: serde_json::Value::Null,
            timestamp_ms: 0,
        }
    }

    pub fn for_modal(mut self, modal_id: &str) -> Self {
        self.modal_id = Some(modal_id.to_string());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

/// Lifecycle phases recorded per modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    Initialized,
    Activated,
    Deactivated,
    Destroyed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub modal_id: String,
    pub phase: LifecyclePhase,
    pub timestamp_ms: u64,
}

/// One logged inter-modal communication request. Fire-and-forget: the log
/// records that a message was sent, it does not deliver it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossModalMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub requires_response: bool,
    pub timestamp_ms: u64,
}
