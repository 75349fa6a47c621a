//! The store/clock traits the pure kernel depends on. Modules under
//! `kernel` (evaluator, progression engine, state machine, projector, set
//! logger) depend only on these, never on `sqlx` directly, so they can be
//! exercised in tests without a database (SPEC_FULL.md §2).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::kernel::error::KernelResult;
use crate::models::*;

/// Monotonic wall-clock abstraction; `daysOut` math and session timestamps
/// flow through this rather than `Utc::now()` directly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Read-only store of templates (spec.md §2). Admin writes are rare and are
/// exposed here too, but nothing under `kernel` ever calls the write half.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_lift(&self, id: Uuid) -> KernelResult<Lift>;
    async fn create_lift(&self, input: CreateLift) -> KernelResult<Lift>;

    async fn get_prescription(&self, id: Uuid) -> KernelResult<Prescription>;
    async fn create_prescription(&self, input: CreatePrescription) -> KernelResult<Prescription>;

    async fn get_day(&self, id: Uuid) -> KernelResult<Day>;
    async fn create_day(&self, input: CreateDay) -> KernelResult<Day>;

    async fn get_week(&self, id: Uuid) -> KernelResult<Week>;
    async fn create_week(&self, input: CreateWeek) -> KernelResult<Week>;

    async fn get_cycle(&self, id: Uuid) -> KernelResult<Cycle>;
    async fn create_cycle(&self, input: CreateCycle) -> KernelResult<Cycle>;
    async fn attach_week(&self, cycle_id: Uuid, week_id: Uuid) -> KernelResult<Cycle>;

    async fn get_program(&self, id: Uuid) -> KernelResult<Program>;
    async fn get_program_by_slug(&self, slug: &str) -> KernelResult<Program>;
    async fn create_program(&self, input: CreateProgram) -> KernelResult<Program>;
    async fn list_programs(&self, filter: &ProgramFilter) -> KernelResult<Page<Program>>;

    async fn get_daily_lookup(&self, id: Uuid) -> KernelResult<DailyLookup>;
    async fn create_daily_lookup(&self, input: CreateDailyLookup) -> KernelResult<DailyLookup>;

    async fn get_weekly_lookup(&self, id: Uuid) -> KernelResult<WeeklyLookup>;
    async fn create_weekly_lookup(&self, input: CreateWeeklyLookup) -> KernelResult<WeeklyLookup>;

    async fn get_progression_definition(&self, id: Uuid) -> KernelResult<ProgressionDefinition>;
    async fn create_progression_definition(
        &self,
        input: CreateProgressionDefinition,
    ) -> KernelResult<(Uuid, ProgressionDefinition)>;

    async fn create_program_progression_link(
        &self,
        input: CreateProgramProgressionLink,
    ) -> KernelResult<ProgramProgressionLink>;
    async fn links_for_program(&self, program_id: Uuid) -> KernelResult<Vec<ProgramProgressionLink>>;
}

/// Per-lifter per-lift max values. Append-only; `current_max` returns the
/// latest row by `created_at` for `(lifter, lift, maxType)`.
#[async_trait]
pub trait LiftMaxStore: Send + Sync {
    async fn record_max(
        &self,
        lifter_id: Uuid,
        lift_id: Uuid,
        max_type: MaxType,
        value: f64,
        at: DateTime<Utc>,
    ) -> KernelResult<LiftMax>;

    async fn current_max(
        &self,
        lifter_id: Uuid,
        lift_id: Uuid,
        max_type: MaxType,
    ) -> KernelResult<Option<LiftMax>>;
}

/// Per-lifter enrollment record and position.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    async fn get(&self, lifter_id: Uuid) -> KernelResult<Option<Enrollment>>;
    async fn put(&self, enrollment: Enrollment) -> KernelResult<Enrollment>;
}

/// Workout sessions and logged sets.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: WorkoutSession) -> KernelResult<WorkoutSession>;
    async fn get_session(&self, id: Uuid) -> KernelResult<Option<WorkoutSession>>;
    async fn put_session(&self, session: WorkoutSession) -> KernelResult<WorkoutSession>;
    async fn in_progress_session(&self, lifter_id: Uuid) -> KernelResult<Option<WorkoutSession>>;

    /// Most recent sessions for a lifter, newest first — the read the
    /// dashboard summary (SPEC_FULL.md §4) is built from.
    async fn recent_sessions(&self, lifter_id: Uuid, limit: i64) -> KernelResult<Vec<WorkoutSession>>;

    async fn append_set(&self, set: LoggedSet) -> KernelResult<LoggedSet>;
    async fn sets_for_session(&self, session_id: Uuid) -> KernelResult<Vec<LoggedSet>>;

    async fn get_progression_state(
        &self,
        lifter_id: Uuid,
        progression_id: Uuid,
        lift_id: Uuid,
    ) -> KernelResult<Option<ProgressionState>>;
    async fn put_progression_state(&self, state: ProgressionState) -> KernelResult<ProgressionState>;
}

/// Shorthand for "implements every port the HTTP layer needs". Lets
/// `AppState` stay generic over the backing store (`PostgresStore` in
/// production, `MemoryStore` in tests) without the handlers caring which.
pub trait Store: Catalog + LiftMaxStore + EnrollmentStore + SessionStore {}

impl<T: Catalog + LiftMaxStore + EnrollmentStore + SessionStore> Store for T {}
