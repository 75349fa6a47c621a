use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

/// One training session. At most one `InProgress` session per lifter is a
/// hard invariant enforced by the `SessionStore`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub lifter_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub week_number: u32,
    pub cycle_iteration: u32,
    pub day_key: String,
}

/// One set logged against a session. `set_number` is unique per
/// `(session, prescription)`; insertion order within a session is preserved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggedSet {
    pub id: Uuid,
    pub session_id: Uuid,
    pub prescription_id: Uuid,
    pub lift_id: Uuid,
    pub set_number: u32,
    pub weight: f64,
    pub target_reps: u32,
    pub reps_performed: u32,
    pub is_amrap: bool,
}

/// One input row of `POST /sessions/{id}/sets`, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct LogSetInput {
    pub prescription_id: Uuid,
    pub lift_id: Uuid,
    pub set_number: u32,
    pub weight: f64,
    pub target_reps: u32,
    pub reps_performed: u32,
    pub is_amrap: bool,
}
