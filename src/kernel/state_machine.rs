//! StateMachine (spec.md §4.7): the sole writer of enrollment status and
//! cycle/week counters. All operations are atomic w.r.t. the enrollment
//! record (spec.md §5: per-lifter pessimistic locking around each call).

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::kernel::error::{KernelError, KernelResult};
use crate::kernel::ports::{Catalog, Clock, EnrollmentStore, LiftMaxStore, SessionStore};
use crate::kernel::progression::{ProgressionEngine, TriggerOptions};
use crate::models::*;

pub struct StateMachine<'a> {
    pub catalog: &'a dyn Catalog,
    pub enrollments: &'a dyn EnrollmentStore,
    pub sessions: &'a dyn SessionStore,
    pub lift_maxes: &'a dyn LiftMaxStore,
    pub clock: &'a dyn Clock,
}

impl<'a> StateMachine<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        enrollments: &'a dyn EnrollmentStore,
        sessions: &'a dyn SessionStore,
        lift_maxes: &'a dyn LiftMaxStore,
        clock: &'a dyn Clock,
    ) -> Self {
        Self { catalog, enrollments, sessions, lift_maxes, clock }
    }

    fn progression_engine(&self) -> ProgressionEngine<'a> {
        ProgressionEngine::new(self.catalog, self.lift_maxes, self.sessions)
    }

    async fn require_enrollment(&self, lifter_id: Uuid) -> KernelResult<Enrollment> {
        self.enrollments.get(lifter_id).await?.ok_or(KernelError::NotEnrolled)
    }

    /// First scheduled day key of a week, in `BTreeMap` (alphabetical)
    /// order — the only order the catalog's `Week::days` mapping defines
    /// deterministically without a separate weekday-ordinal field.
    fn first_day_key(week: &Week) -> KernelResult<String> {
        week.days
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| KernelError::Validation("week has no scheduled days".into()))
    }

    fn week_for(&self, cycle: &Cycle, week_number: u32) -> KernelResult<Week> {
        cycle
            .weeks
            .iter()
            .find(|w| w.week_number == week_number)
            .cloned()
            .ok_or_else(|| KernelError::NotFound(format!("week {week_number}")))
    }

    /// **Enroll(lifter, programId).** Pre: no non-QUIT enrollment exists.
    pub async fn enroll(&self, lifter_id: Uuid, program_id: Uuid, now: DateTime<Utc>) -> KernelResult<Enrollment> {
        if let Some(existing) = self.enrollments.get(lifter_id).await? {
            if existing.enrollment_status != EnrollmentStatus::Quit {
                return Err(KernelError::AlreadyEnrolled);
            }
        }

        let program = self.catalog.get_program(program_id).await?;
        let cycle = self.catalog.get_cycle(program.cycle_id).await?;
        let week1 = self.week_for(&cycle, 1)?;
        let first_day = Self::first_day_key(&week1)?;

        let enrollment = Enrollment {
            lifter_id,
            program_id,
            enrollment_status: EnrollmentStatus::Active,
            cycle_status: CycleStatus::Pending,
            week_status: WeekStatus::Pending,
            current_week: 1,
            current_day_key: first_day,
            cycle_iteration: 1,
            meet_date: None,
            created_at: now,
            updated_at: now,
        };
        self.enrollments.put(enrollment.clone()).await?;
        Ok(enrollment)
    }

    /// **Unenroll(lifter).** Idempotent; abandons any open session as a
    /// side-effect.
    pub async fn unenroll(&self, lifter_id: Uuid, now: DateTime<Utc>) -> KernelResult<Enrollment> {
        let mut enrollment = self.require_enrollment(lifter_id).await?;

        if let Some(session) = self.sessions.in_progress_session(lifter_id).await? {
            let mut session = session;
            session.status = SessionStatus::Abandoned;
            self.sessions.put_session(session).await?;
        }

        enrollment.enrollment_status = EnrollmentStatus::Quit;
        enrollment.updated_at = now;
        self.enrollments.put(enrollment.clone()).await?;
        Ok(enrollment)
    }

    /// **StartSession(lifter).**
    pub async fn start_session(&self, lifter_id: Uuid, now: DateTime<Utc>) -> KernelResult<WorkoutSession> {
        let enrollment = self.require_enrollment(lifter_id).await?;
        if enrollment.enrollment_status != EnrollmentStatus::Active {
            return Err(KernelError::InvalidEnrollmentState(format!(
                "{:?}",
                enrollment.enrollment_status
            )));
        }
        if self.sessions.in_progress_session(lifter_id).await?.is_some() {
            return Err(KernelError::SessionAlreadyOpen);
        }

        let session = WorkoutSession {
            id: Uuid::new_v4(),
            lifter_id,
            started_at: now,
            finished_at: None,
            status: SessionStatus::InProgress,
            week_number: enrollment.current_week,
            cycle_iteration: enrollment.cycle_iteration,
            day_key: enrollment.current_day_key.clone(),
        };
        self.sessions.create_session(session.clone()).await?;
        Ok(session)
    }

    /// **FinishSession(session).** Pre: IN_PROGRESS, at least one LoggedSet.
    pub async fn finish_session(&self, session_id: Uuid, now: DateTime<Utc>) -> KernelResult<WorkoutSession> {
        let mut session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or_else(|| KernelError::NotFound(format!("session {session_id}")))?;
        if session.status != SessionStatus::InProgress {
            return Err(KernelError::SessionNotOpen);
        }
        let sets = self.sessions.sets_for_session(session_id).await?;
        if sets.is_empty() {
            return Err(KernelError::Validation("cannot finish a session with no logged sets".into()));
        }

        session.status = SessionStatus::Completed;
        session.finished_at = Some(now);
        self.sessions.put_session(session.clone()).await?;

        // AFTER_SESSION progressions for every lift linked to this lifter's
        // program, fire-and-continue: a progression declining (e.g. not
        // linked, or gated) is not an error for the finishing caller.
        let enrollment = self.require_enrollment(session.lifter_id).await?;
        let links = self.catalog.links_for_program(enrollment.program_id).await?;
        let engine = self.progression_engine();
        for link in &links {
            let _ = engine
                .trigger(
                    session.lifter_id,
                    enrollment.program_id,
                    link.progression_id,
                    link.lift_id,
                    TriggerType::AfterSession,
                    TriggerOptions { force: false, session_id: Some(session.id) },
                    now,
                )
                .await;
        }

        Ok(session)
    }

    /// **AbandonSession(session).**
    pub async fn abandon_session(&self, session_id: Uuid, now: DateTime<Utc>) -> KernelResult<WorkoutSession> {
        let mut session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or_else(|| KernelError::NotFound(format!("session {session_id}")))?;
        if session.status != SessionStatus::InProgress {
            return Err(KernelError::SessionNotOpen);
        }
        session.status = SessionStatus::Abandoned;
        session.finished_at = Some(now);
        self.sessions.put_session(session.clone()).await?;
        Ok(session)
    }

    /// **AdvanceDay(lifter).** Pre: no IN_PROGRESS session. Falls through
    /// to `advance_week` when already at the week's last scheduled day.
    pub async fn advance_day(&self, lifter_id: Uuid, now: DateTime<Utc>) -> KernelResult<Enrollment> {
        let enrollment = self.require_enrollment(lifter_id).await?;
        if self.sessions.in_progress_session(lifter_id).await?.is_some() {
            return Err(KernelError::SessionAlreadyOpen);
        }
        if enrollment.enrollment_status != EnrollmentStatus::Active {
            return Err(KernelError::InvalidEnrollmentState(format!(
                "{:?}",
                enrollment.enrollment_status
            )));
        }

        let program = self.catalog.get_program(enrollment.program_id).await?;
        let cycle = self.catalog.get_cycle(program.cycle_id).await?;
        let week = self.week_for(&cycle, enrollment.current_week)?;

        let keys: Vec<&String> = week.days.keys().collect();
        let position = keys.iter().position(|k| **k == enrollment.current_day_key);

        match position {
            Some(idx) if idx + 1 < keys.len() => {
                let mut enrollment = enrollment;
                enrollment.current_day_key = keys[idx + 1].clone();
                enrollment.updated_at = now;
                self.enrollments.put(enrollment.clone()).await?;
                Ok(enrollment)
            }
            _ => self.advance_week(lifter_id, now).await,
        }
    }

    /// **AdvanceWeek(lifter).**
    pub async fn advance_week(&self, lifter_id: Uuid, now: DateTime<Utc>) -> KernelResult<Enrollment> {
        let mut enrollment = self.require_enrollment(lifter_id).await?;
        if self.sessions.in_progress_session(lifter_id).await?.is_some() {
            return Err(KernelError::SessionAlreadyOpen);
        }
        if enrollment.enrollment_status != EnrollmentStatus::Active {
            return Err(KernelError::InvalidEnrollmentState(format!(
                "{:?}",
                enrollment.enrollment_status
            )));
        }

        let program = self.catalog.get_program(enrollment.program_id).await?;
        let cycle = self.catalog.get_cycle(program.cycle_id).await?;

        enrollment.week_status = WeekStatus::Completed;

        if enrollment.current_week < cycle.length_weeks {
            enrollment.current_week += 1;
            enrollment.week_status = WeekStatus::Pending;
            let next_week = self.week_for(&cycle, enrollment.current_week)?;
            enrollment.current_day_key = Self::first_day_key(&next_week)?;
            enrollment.updated_at = now;
            self.enrollments.put(enrollment.clone()).await?;

            // Only progressions meant to fire per-week advance here. Without
            // this filter, a linked CycleProgression (whose trigger_type()
            // hardcodes AFTER_WEEK) would pass the engine's gate on every
            // non-final week too, instead of only at cycle completion
            // (spec.md §4.6.d).
            let links = self.catalog.links_for_program(enrollment.program_id).await?;
            let engine = self.progression_engine();
            for link in &links {
                let def = self.catalog.get_progression_definition(link.progression_id).await?;
                if matches!(def, ProgressionDefinition::CycleProgression { .. }) {
                    continue;
                }
                if def.trigger_type() != TriggerType::AfterWeek {
                    continue;
                }
                let _ = engine
                    .trigger(
                        lifter_id,
                        enrollment.program_id,
                        link.progression_id,
                        link.lift_id,
                        TriggerType::AfterWeek,
                        TriggerOptions { force: false, session_id: None },
                        now,
                    )
                    .await;
            }
        } else {
            enrollment.cycle_status = CycleStatus::Completed;
            enrollment.enrollment_status = EnrollmentStatus::BetweenCycles;
            enrollment.updated_at = now;
            self.enrollments.put(enrollment.clone()).await?;

            let links = self.catalog.links_for_program(enrollment.program_id).await?;
            let engine = self.progression_engine();
            for link in &links {
                let def = self.catalog.get_progression_definition(link.progression_id).await?;
                if matches!(def, ProgressionDefinition::CycleProgression { .. }) {
                    let _ = engine
                        .trigger(
                            lifter_id,
                            enrollment.program_id,
                            link.progression_id,
                            link.lift_id,
                            TriggerType::AfterWeek,
                            TriggerOptions { force: true, session_id: None },
                            now,
                        )
                        .await;
                }
            }
        }

        Ok(enrollment)
    }

    /// **StartNextCycle(lifter).** Pre: `BETWEEN_CYCLES`.
    pub async fn start_next_cycle(&self, lifter_id: Uuid, now: DateTime<Utc>) -> KernelResult<Enrollment> {
        let mut enrollment = self.require_enrollment(lifter_id).await?;
        if enrollment.enrollment_status != EnrollmentStatus::BetweenCycles {
            return Err(KernelError::InvalidEnrollmentState(format!(
                "{:?}",
                enrollment.enrollment_status
            )));
        }

        let program = self.catalog.get_program(enrollment.program_id).await?;
        let cycle = self.catalog.get_cycle(program.cycle_id).await?;
        let week1 = self.week_for(&cycle, 1)?;

        enrollment.cycle_iteration += 1;
        enrollment.cycle_status = CycleStatus::Pending;
        enrollment.week_status = WeekStatus::Pending;
        enrollment.current_week = 1;
        enrollment.current_day_key = Self::first_day_key(&week1)?;
        enrollment.enrollment_status = EnrollmentStatus::Active;
        enrollment.updated_at = now;
        self.enrollments.put(enrollment.clone()).await?;
        Ok(enrollment)
    }

    /// **SetMeetDate(lifter, date?).** Current week/cycle unaffected.
    pub async fn set_meet_date(&self, lifter_id: Uuid, date: Option<NaiveDate>, now: DateTime<Utc>) -> KernelResult<Enrollment> {
        let mut enrollment = self.require_enrollment(lifter_id).await?;
        enrollment.meet_date = date;
        enrollment.updated_at = now;
        self.enrollments.put(enrollment.clone()).await?;
        Ok(enrollment)
    }
}
