use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-`(lifter, progression, lift)` mutable state. Created lazily on first
/// observation, per spec.md §3.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressionState {
    pub lifter_id: Uuid,
    pub progression_id: Uuid,
    pub lift_id: Uuid,
    pub failure_count: u32,
    pub current_stage: usize,
    pub last_applied_at: Option<DateTime<Utc>>,
    /// Sessions this state has already applied an AFTER_SET progression for,
    /// realizing the "idempotent per session" reading of the AFTER_SET open
    /// question (spec.md §9).
    pub applied_in_sessions: std::collections::BTreeSet<Uuid>,
}

impl ProgressionState {
    pub fn new(lifter_id: Uuid, progression_id: Uuid, lift_id: Uuid, initial_stage: usize) -> Self {
        Self {
            lifter_id,
            progression_id,
            lift_id,
            failure_count: 0,
            current_stage: initial_stage,
            last_applied_at: None,
            applied_in_sessions: std::collections::BTreeSet::new(),
        }
    }
}
