use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Active,
    BetweenCycles,
    Quit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeekStatus {
    Pending,
    InProgress,
    Completed,
}

/// A lifter's position within a program. At most one non-`Quit` enrollment
/// per lifter is a hard invariant enforced by the `EnrollmentStore`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enrollment {
    pub lifter_id: Uuid,
    pub program_id: Uuid,
    pub enrollment_status: EnrollmentStatus,
    pub cycle_status: CycleStatus,
    pub week_status: WeekStatus,
    pub current_week: u32,
    pub current_day_key: String,
    pub cycle_iteration: u32,
    pub meet_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
