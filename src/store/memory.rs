//! In-process store behind `Mutex`/`RwLock`, used by the kernel's own test
//! suite and available for local/dev runs without Postgres
//! (SPEC_FULL.md §2).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::kernel::error::{KernelError, KernelResult};
use crate::kernel::ports::{Catalog, Clock, EnrollmentStore, LiftMaxStore, SessionStore};
use crate::models::*;

#[derive(Default)]
struct CatalogInner {
    lifts: HashMap<Uuid, Lift>,
    prescriptions: HashMap<Uuid, Prescription>,
    days: HashMap<Uuid, Day>,
    weeks: HashMap<Uuid, Week>,
    cycles: HashMap<Uuid, Cycle>,
    programs: HashMap<Uuid, Program>,
    daily_lookups: HashMap<Uuid, DailyLookup>,
    weekly_lookups: HashMap<Uuid, WeeklyLookup>,
    progression_defs: HashMap<Uuid, ProgressionDefinition>,
    links: Vec<ProgramProgressionLink>,
}

pub struct MemoryStore {
    catalog: RwLock<CatalogInner>,
    pub lift_maxes: MemoryLiftMaxStore,
    pub enrollments: MemoryEnrollmentStore,
    pub sessions: MemorySessionStore,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(CatalogInner::default()),
            lift_maxes: MemoryLiftMaxStore::default(),
            enrollments: MemoryEnrollmentStore::default(),
            sessions: MemorySessionStore::default(),
        }
    }

    /// Test helper: link a progression to a lift within a program.
    pub async fn seed_link(&self, program_id: Uuid, progression_id: Uuid, lift_id: Uuid) {
        let mut inner = self.catalog.write().unwrap();
        inner.links.push(ProgramProgressionLink { id: Uuid::new_v4(), program_id, progression_id, lift_id, order: 0 });
    }

    /// Test helper: insert a progression definition at a known id.
    pub async fn seed_progression(&self, id: Uuid, definition: ProgressionDefinition) {
        let mut inner = self.catalog.write().unwrap();
        inner.progression_defs.insert(id, definition);
    }

    /// Test helper: open an IN_PROGRESS session for a lifter.
    pub async fn seed_in_progress_session(&self, lifter_id: Uuid) -> WorkoutSession {
        let session = WorkoutSession {
            id: Uuid::new_v4(),
            lifter_id,
            started_at: Utc::now(),
            finished_at: None,
            status: SessionStatus::InProgress,
            week_number: 1,
            cycle_iteration: 1,
            day_key: "monday".into(),
        };
        self.sessions.create_session(session.clone()).await.unwrap();
        session
    }

    /// Test helper: seed a `ProgressionState` directly.
    pub async fn seed_progression_state(&self, state: ProgressionState) {
        self.sessions.put_progression_state(state).await.unwrap();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn get_lift(&self, id: Uuid) -> KernelResult<Lift> {
        self.catalog.read().unwrap().lifts.get(&id).cloned().ok_or_else(|| KernelError::NotFound(format!("lift {id}")))
    }

    async fn create_lift(&self, input: CreateLift) -> KernelResult<Lift> {
        let lift = Lift { id: Uuid::new_v4(), name: input.name, slug: input.slug, is_competition_lift: input.is_competition_lift };
        self.catalog.write().unwrap().lifts.insert(lift.id, lift.clone());
        Ok(lift)
    }

    async fn get_prescription(&self, id: Uuid) -> KernelResult<Prescription> {
        self.catalog.read().unwrap().prescriptions.get(&id).cloned().ok_or_else(|| KernelError::NotFound(format!("prescription {id}")))
    }

    async fn create_prescription(&self, input: CreatePrescription) -> KernelResult<Prescription> {
        let p = Prescription { id: Uuid::new_v4(), lift_id: input.lift_id, load_strategy: input.load_strategy, set_scheme: input.set_scheme, order: input.order };
        self.catalog.write().unwrap().prescriptions.insert(p.id, p.clone());
        Ok(p)
    }

    async fn get_day(&self, id: Uuid) -> KernelResult<Day> {
        self.catalog.read().unwrap().days.get(&id).cloned().ok_or_else(|| KernelError::NotFound(format!("day {id}")))
    }

    async fn create_day(&self, input: CreateDay) -> KernelResult<Day> {
        let inner = self.catalog.read().unwrap();
        let mut prescriptions: Vec<Prescription> = input
            .prescription_ids
            .iter()
            .filter_map(|pid| inner.prescriptions.get(pid).cloned())
            .collect();
        drop(inner);
        prescriptions.sort_by_key(|p| p.order);
        let day = Day { id: Uuid::new_v4(), name: input.name, slug: input.slug, prescriptions };
        self.catalog.write().unwrap().days.insert(day.id, day.clone());
        Ok(day)
    }

    async fn get_week(&self, id: Uuid) -> KernelResult<Week> {
        self.catalog.read().unwrap().weeks.get(&id).cloned().ok_or_else(|| KernelError::NotFound(format!("week {id}")))
    }

    async fn create_week(&self, input: CreateWeek) -> KernelResult<Week> {
        let inner = self.catalog.read().unwrap();
        let mut days = std::collections::BTreeMap::new();
        for (key, day_id) in &input.days {
            if let Some(day) = inner.days.get(day_id) {
                days.insert(key.clone(), day.clone());
            }
        }
        drop(inner);
        let week = Week { id: Uuid::new_v4(), cycle_id: input.cycle_id, week_number: input.week_number, days };
        self.catalog.write().unwrap().weeks.insert(week.id, week.clone());
        Ok(week)
    }

    async fn get_cycle(&self, id: Uuid) -> KernelResult<Cycle> {
        self.catalog.read().unwrap().cycles.get(&id).cloned().ok_or_else(|| KernelError::NotFound(format!("cycle {id}")))
    }

    async fn create_cycle(&self, input: CreateCycle) -> KernelResult<Cycle> {
        let cycle = Cycle { id: Uuid::new_v4(), name: input.name, length_weeks: input.length_weeks, weeks: Vec::new() };
        self.catalog.write().unwrap().cycles.insert(cycle.id, cycle.clone());
        Ok(cycle)
    }

    async fn attach_week(&self, cycle_id: Uuid, week_id: Uuid) -> KernelResult<Cycle> {
        let mut inner = self.catalog.write().unwrap();
        let week = inner.weeks.get(&week_id).cloned().ok_or_else(|| KernelError::NotFound(format!("week {week_id}")))?;
        if week.week_number < 1 {
            return Err(KernelError::Validation("weekNumber must be >= 1".into()));
        }
        let cycle = inner.cycles.get_mut(&cycle_id).ok_or_else(|| KernelError::NotFound(format!("cycle {cycle_id}")))?;
        if week.week_number > cycle.length_weeks {
            return Err(KernelError::Validation("weekNumber exceeds cycle length".into()));
        }
        if cycle.weeks.iter().any(|w| w.week_number == week.week_number) {
            return Err(KernelError::Validation("weekNumber already present in cycle".into()));
        }
        cycle.weeks.push(week);
        Ok(cycle.clone())
    }

    async fn get_program(&self, id: Uuid) -> KernelResult<Program> {
        self.catalog.read().unwrap().programs.get(&id).cloned().ok_or_else(|| KernelError::NotFound(format!("program {id}")))
    }

    async fn get_program_by_slug(&self, slug: &str) -> KernelResult<Program> {
        self.catalog
            .read()
            .unwrap()
            .programs
            .values()
            .find(|p| p.slug == slug)
            .cloned()
            .ok_or_else(|| KernelError::NotFound(format!("program {slug}")))
    }

    async fn create_program(&self, input: CreateProgram) -> KernelResult<Program> {
        let program = Program {
            id: Uuid::new_v4(),
            name: input.name,
            slug: input.slug,
            cycle_id: input.cycle_id,
            weekly_lookup_id: input.weekly_lookup_id,
            daily_lookup_id: input.daily_lookup_id,
            default_rounding: input.default_rounding,
            difficulty: input.difficulty,
            days_per_week: input.days_per_week,
            focus: input.focus,
            has_amrap: input.has_amrap,
            taper_enabled: input.taper_enabled,
        };
        self.catalog.write().unwrap().programs.insert(program.id, program.clone());
        Ok(program)
    }

    async fn list_programs(&self, filter: &ProgramFilter) -> KernelResult<Page<Program>> {
        let inner = self.catalog.read().unwrap();
        let mut matching: Vec<Program> = inner.programs.values().filter(|p| filter.matches(p)).cloned().collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        let total = matching.len() as i64;
        let (limit, offset) = (filter.limit(), filter.offset());
        let items = matching.into_iter().skip(offset as usize).take(limit as usize).collect();
        Ok(Page::new(items, total, limit, offset))
    }

    async fn get_daily_lookup(&self, id: Uuid) -> KernelResult<DailyLookup> {
        self.catalog.read().unwrap().daily_lookups.get(&id).cloned().ok_or_else(|| KernelError::NotFound(format!("daily lookup {id}")))
    }

    async fn create_daily_lookup(&self, input: CreateDailyLookup) -> KernelResult<DailyLookup> {
        let lookup = DailyLookup { id: Uuid::new_v4(), entries: input.entries };
        self.catalog.write().unwrap().daily_lookups.insert(lookup.id, lookup.clone());
        Ok(lookup)
    }

    async fn get_weekly_lookup(&self, id: Uuid) -> KernelResult<WeeklyLookup> {
        self.catalog.read().unwrap().weekly_lookups.get(&id).cloned().ok_or_else(|| KernelError::NotFound(format!("weekly lookup {id}")))
    }

    async fn create_weekly_lookup(&self, input: CreateWeeklyLookup) -> KernelResult<WeeklyLookup> {
        let lookup = WeeklyLookup { id: Uuid::new_v4(), entries: input.entries };
        self.catalog.write().unwrap().weekly_lookups.insert(lookup.id, lookup.clone());
        Ok(lookup)
    }

    async fn get_progression_definition(&self, id: Uuid) -> KernelResult<ProgressionDefinition> {
        self.catalog.read().unwrap().progression_defs.get(&id).cloned().ok_or_else(|| KernelError::NotFound(format!("progression {id}")))
    }

    async fn create_progression_definition(&self, input: CreateProgressionDefinition) -> KernelResult<(Uuid, ProgressionDefinition)> {
        let id = Uuid::new_v4();
        self.catalog.write().unwrap().progression_defs.insert(id, input.definition.clone());
        Ok((id, input.definition))
    }

    async fn create_program_progression_link(&self, input: CreateProgramProgressionLink) -> KernelResult<ProgramProgressionLink> {
        let mut inner = self.catalog.write().unwrap();
        if inner.links.iter().any(|l| l.program_id == input.program_id && l.lift_id == input.lift_id) {
            return Err(KernelError::Validation("lift already linked to a progression in this program".into()));
        }
        let link = ProgramProgressionLink { id: Uuid::new_v4(), program_id: input.program_id, progression_id: input.progression_id, lift_id: input.lift_id, order: input.order };
        inner.links.push(link.clone());
        Ok(link)
    }

    async fn links_for_program(&self, program_id: Uuid) -> KernelResult<Vec<ProgramProgressionLink>> {
        Ok(self.catalog.read().unwrap().links.iter().filter(|l| l.program_id == program_id).cloned().collect())
    }
}

// `MemoryStore` delegates to its three substores so the type itself (not
// just its fields) satisfies `Catalog + LiftMaxStore + EnrollmentStore +
// SessionStore`, i.e. `kernel::ports::Store` — the bound the HTTP layer
// uses to stay agnostic between this and `PostgresStore`.
#[async_trait]
impl LiftMaxStore for MemoryStore {
    async fn record_max(&self, lifter_id: Uuid, lift_id: Uuid, max_type: MaxType, value: f64, at: DateTime<Utc>) -> KernelResult<LiftMax> {
        self.lift_maxes.record_max(lifter_id, lift_id, max_type, value, at).await
    }

    async fn current_max(&self, lifter_id: Uuid, lift_id: Uuid, max_type: MaxType) -> KernelResult<Option<LiftMax>> {
        self.lift_maxes.current_max(lifter_id, lift_id, max_type).await
    }
}

#[async_trait]
impl EnrollmentStore for MemoryStore {
    async fn get(&self, lifter_id: Uuid) -> KernelResult<Option<Enrollment>> {
        self.enrollments.get(lifter_id).await
    }

    async fn put(&self, enrollment: Enrollment) -> KernelResult<Enrollment> {
        self.enrollments.put(enrollment).await
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, session: WorkoutSession) -> KernelResult<WorkoutSession> {
        self.sessions.create_session(session).await
    }

    async fn get_session(&self, id: Uuid) -> KernelResult<Option<WorkoutSession>> {
        self.sessions.get_session(id).await
    }

    async fn put_session(&self, session: WorkoutSession) -> KernelResult<WorkoutSession> {
        self.sessions.put_session(session).await
    }

    async fn in_progress_session(&self, lifter_id: Uuid) -> KernelResult<Option<WorkoutSession>> {
        self.sessions.in_progress_session(lifter_id).await
    }

    async fn recent_sessions(&self, lifter_id: Uuid, limit: i64) -> KernelResult<Vec<WorkoutSession>> {
        self.sessions.recent_sessions(lifter_id, limit).await
    }

    async fn append_set(&self, set: LoggedSet) -> KernelResult<LoggedSet> {
        self.sessions.append_set(set).await
    }

    async fn sets_for_session(&self, session_id: Uuid) -> KernelResult<Vec<LoggedSet>> {
        self.sessions.sets_for_session(session_id).await
    }

    async fn get_progression_state(&self, lifter_id: Uuid, progression_id: Uuid, lift_id: Uuid) -> KernelResult<Option<ProgressionState>> {
        self.sessions.get_progression_state(lifter_id, progression_id, lift_id).await
    }

    async fn put_progression_state(&self, state: ProgressionState) -> KernelResult<ProgressionState> {
        self.sessions.put_progression_state(state).await
    }
}

#[derive(Default)]
pub struct MemoryLiftMaxStore {
    maxes: RwLock<Vec<LiftMax>>,
}

#[async_trait]
impl LiftMaxStore for MemoryLiftMaxStore {
    async fn record_max(&self, lifter_id: Uuid, lift_id: Uuid, max_type: MaxType, value: f64, at: DateTime<Utc>) -> KernelResult<LiftMax> {
        let record = LiftMax { id: Uuid::new_v4(), lifter_id, lift_id, max_type, value, created_at: at };
        self.maxes.write().unwrap().push(record.clone());
        Ok(record)
    }

    async fn current_max(&self, lifter_id: Uuid, lift_id: Uuid, max_type: MaxType) -> KernelResult<Option<LiftMax>> {
        Ok(self
            .maxes
            .read()
            .unwrap()
            .iter()
            .filter(|m| m.lifter_id == lifter_id && m.lift_id == lift_id && m.max_type == max_type)
            .max_by_key(|m| m.created_at)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryEnrollmentStore {
    enrollments: RwLock<HashMap<Uuid, Enrollment>>,
}

#[async_trait]
impl EnrollmentStore for MemoryEnrollmentStore {
    async fn get(&self, lifter_id: Uuid) -> KernelResult<Option<Enrollment>> {
        Ok(self.enrollments.read().unwrap().get(&lifter_id).cloned())
    }

    async fn put(&self, enrollment: Enrollment) -> KernelResult<Enrollment> {
        self.enrollments.write().unwrap().insert(enrollment.lifter_id, enrollment.clone());
        Ok(enrollment)
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, WorkoutSession>>,
    sets: RwLock<Vec<LoggedSet>>,
    progression_states: RwLock<HashMap<(Uuid, Uuid, Uuid), ProgressionState>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, session: WorkoutSession) -> KernelResult<WorkoutSession> {
        self.sessions.write().unwrap().insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> KernelResult<Option<WorkoutSession>> {
        Ok(self.sessions.read().unwrap().get(&id).cloned())
    }

    async fn put_session(&self, session: WorkoutSession) -> KernelResult<WorkoutSession> {
        self.sessions.write().unwrap().insert(session.id, session.clone());
        Ok(session)
    }

    async fn in_progress_session(&self, lifter_id: Uuid) -> KernelResult<Option<WorkoutSession>> {
        Ok(self
            .sessions
            .read()
            .unwrap()
            .values()
            .find(|s| s.lifter_id == lifter_id && s.status == SessionStatus::InProgress)
            .cloned())
    }

    async fn recent_sessions(&self, lifter_id: Uuid, limit: i64) -> KernelResult<Vec<WorkoutSession>> {
        let mut sessions: Vec<WorkoutSession> = self
            .sessions
            .read()
            .unwrap()
            .values()
            .filter(|s| s.lifter_id == lifter_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions.truncate(limit.max(0) as usize);
        Ok(sessions)
    }

    async fn append_set(&self, set: LoggedSet) -> KernelResult<LoggedSet> {
        self.sets.write().unwrap().push(set.clone());
        Ok(set)
    }

    async fn sets_for_session(&self, session_id: Uuid) -> KernelResult<Vec<LoggedSet>> {
        Ok(self.sets.read().unwrap().iter().filter(|s| s.session_id == session_id).cloned().collect())
    }

    async fn get_progression_state(&self, lifter_id: Uuid, progression_id: Uuid, lift_id: Uuid) -> KernelResult<Option<ProgressionState>> {
        Ok(self.progression_states.read().unwrap().get(&(lifter_id, progression_id, lift_id)).cloned())
    }

    async fn put_progression_state(&self, state: ProgressionState) -> KernelResult<ProgressionState> {
        self.progression_states
            .write()
            .unwrap()
            .insert((state.lifter_id, state.progression_id, state.lift_id), state.clone());
        Ok(state)
    }
}

/// Wall clock, overridable via `CLOCK_NOW` (spec.md §6 Environment) for
/// deterministic tests.
pub struct SystemClock {
    override_now: Option<DateTime<Utc>>,
}

impl SystemClock {
    pub fn from_env() -> Self {
        let override_now = std::env::var("CLOCK_NOW")
            .ok()
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        Self { override_now }
    }

    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self { override_now: Some(at) }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        self.override_now.unwrap_or_else(Utc::now)
    }
}
