use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::lift::MaxType;

/// When a progression rule evaluates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    AfterSet,
    AfterSession,
    AfterWeek,
}

/// One `minReps -> increment` rung of an `AmrapProgression`'s ladder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AmrapThreshold {
    pub min_reps: u32,
    pub increment: f64,
}

/// One stage of a `StageProgression`'s ladder (e.g. GZCLP T2 3x10/3x8/3x6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stage {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    pub is_amrap: bool,
    pub min_volume: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressionDefinition {
    LinearProgression {
        increment: f64,
        max_type: MaxType,
        trigger_type: TriggerType,
    },
    AmrapProgression {
        max_type: MaxType,
        trigger_type: TriggerType,
        /// Ordered ascending by `min_reps`; the evaluator relies on this order
        /// to find the greatest-`min_reps` threshold that still qualifies.
        thresholds: Vec<AmrapThreshold>,
    },
    StageProgression {
        stages: Vec<Stage>,
        current_stage: usize,
        reset_on_exhaustion: bool,
        deload_on_reset: bool,
        deload_percent: f64,
        max_type: MaxType,
    },
    CycleProgression {
        increment: f64,
        max_type: MaxType,
    },
}

impl ProgressionDefinition {
    pub fn max_type(&self) -> MaxType {
        match self {
            ProgressionDefinition::LinearProgression { max_type, .. } => *max_type,
            ProgressionDefinition::AmrapProgression { max_type, .. } => *max_type,
            ProgressionDefinition::StageProgression { max_type, .. } => *max_type,
            ProgressionDefinition::CycleProgression { max_type, .. } => *max_type,
        }
    }

    /// Implicit for `CycleProgression`, explicit otherwise.
    pub fn trigger_type(&self) -> TriggerType {
        match self {
            ProgressionDefinition::LinearProgression { trigger_type, .. } => *trigger_type,
            ProgressionDefinition::AmrapProgression { trigger_type, .. } => *trigger_type,
            ProgressionDefinition::StageProgression { .. } => TriggerType::AfterSession,
            ProgressionDefinition::CycleProgression { .. } => TriggerType::AfterWeek,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgressionDefinition {
    #[serde(flatten)]
    pub definition: ProgressionDefinition,
}

/// `(program, progression, lift)` link; a lift may appear under at most one
/// progression per program (enforced by the catalog on write).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramProgressionLink {
    pub id: Uuid,
    pub program_id: Uuid,
    pub progression_id: Uuid,
    pub lift_id: Uuid,
    pub order: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgramProgressionLink {
    pub program_id: Uuid,
    pub progression_id: Uuid,
    pub lift_id: Uuid,
    pub order: i32,
}
