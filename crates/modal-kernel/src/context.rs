//! Context snapshots supplied by the host session layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::descriptor::Platform;

/// What the user is currently doing, as seen by the orchestration engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalContext {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_intent: Option<String>,
    #[serde(default)]
    pub relevant_data_points: Vec<String>,
    /// Host-reported load, 0.0–1.0
    #[serde(default)]
    pub system_load: f64,
    pub platform: Platform,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ModalContext {
    pub fn new(user_id: &str, platform: Platform) -> Self {
        Self {
            user_id: user_id.to_string(),
            session_id: None,
            conversation_topic: None,
            user_intent: None,
            relevant_data_points: Vec::new(),
            system_load: 0.0,
            platform,
            timestamp: Utc::now(),
        }
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn with_topic(mut self, topic: &str) -> Self {
        self.conversation_topic = Some(topic.to_string());
        self
    }

    pub fn with_intent(mut self, intent: &str) -> Self {
        self.user_intent = Some(intent.to_string());
        self
    }

    pub fn with_data_point(mut self, point: &str) -> Self {
        self.relevant_data_points.push(point.to_string());
        self
    }

    pub fn with_system_load(mut self, load: f64) -> Self {
        self.system_load = load;
        self
    }

    /// Every string the activation triggers are matched against, in order:
    /// topic, intent, then the data points.
    pub fn match_candidates(&self) -> Vec<&str> {
        self.conversation_topic
            .as_deref()
            .into_iter()
            .chain(self.user_intent.as_deref())
            .chain(self.relevant_data_points.iter().map(String::as_str))
            .collect()
    }
}

/// Recovery assessment produced by the (external) recovery scoring module.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecoveryAnalysis {
    /// 0–100, higher is better recovered
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// One completed training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub date: DateTime<Utc>,
    pub duration_minutes: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<String>,
}

impl WorkoutRecord {
    pub fn new(date: DateTime<Utc>, duration_minutes: f64) -> Self {
        Self {
            date,
            duration_minutes,
            workout_type: None,
        }
    }
}

/// Habit tracking snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitRecord {
    pub name: String,
    #[serde(default)]
    pub completed_today: bool,
    #[serde(default)]
    pub streak_days: u32,
}

/// Live physiological and schedule state used by the adaptation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalAdaptationContext {
    /// Context used to find the compatible modals to adapt.
    pub modal_context: ModalContext,
    /// Self-reported energy, 1–10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_analysis: Option<RecoveryAnalysis>,
    #[serde(default)]
    pub recent_workouts: Vec<WorkoutRecord>,
    #[serde(default)]
    pub habits: Vec<HabitRecord>,
    /// Free-form user profile data addressable from `field` conditions.
    #[serde(default)]
    pub user_data: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_screen: Option<String>,
}

impl ModalAdaptationContext {
    pub fn new(modal_context: ModalContext) -> Self {
        Self {
            modal_context,
            energy_level: None,
            recovery_analysis: None,
            recent_workouts: Vec::new(),
            habits: Vec::new(),
            user_data: serde_json::Map::new(),
            current_screen: None,
        }
    }

    pub fn with_energy(mut self, level: f64) -> Self {
        self.energy_level = Some(level);
        self
    }

    pub fn with_recovery_score(mut self, score: f64) -> Self {
        self.recovery_analysis = Some(RecoveryAnalysis {
            score,
            ..Default::default()
        });
        self
    }

    pub fn with_workout(mut self, workout: WorkoutRecord) -> Self {
        self.recent_workouts.push(workout);
        self
    }

    pub fn with_user_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.user_data.insert(key.to_string(), value);
        self
    }

    pub fn with_screen(mut self, screen: &str) -> Self {
        self.current_screen = Some(screen.to_string());
        self
    }
}
