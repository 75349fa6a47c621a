//! `sqlx::PgPool`-backed store, the production implementation of the
//! `kernel::ports` traits. Follows the query style of the teacher crate's
//! `auth::service` (runtime `sqlx::query_as::<_, T>(..).bind(..)`, not the
//! compile-time `query!` macro family, since those require a live
//! `DATABASE_URL` at build time) (SPEC_FULL.md §2).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::kernel::error::{KernelError, KernelResult};
use crate::kernel::ports::{Catalog, EnrollmentStore, LiftMaxStore, SessionStore};
use crate::models::*;

#[derive(Clone)]
pub struct PostgresStore {
    pub pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db(err: sqlx::Error) -> KernelError {
    KernelError::Store(err.into())
}

/// Encode a unit-ish `serde`-tagged enum (`MaxType`, `EnrollmentStatus`, ...)
/// as the `TEXT` its column stores, reusing the same `SCREAMING_SNAKE_CASE`
/// rendering `serde` already gives it rather than a second hand-written map.
fn enum_to_text<T: serde::Serialize>(value: &T) -> KernelResult<String> {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| KernelError::Store(anyhow::anyhow!("failed to encode enum column")))
}

fn text_to_enum<T: serde::de::DeserializeOwned>(text: &str) -> KernelResult<T> {
    serde_json::from_value(serde_json::Value::String(text.to_string())).map_err(|e| KernelError::Store(e.into()))
}

#[derive(sqlx::FromRow)]
struct LiftRow {
    id: Uuid,
    name: String,
    slug: String,
    is_competition_lift: bool,
}

impl From<LiftRow> for Lift {
    fn from(r: LiftRow) -> Self {
        Lift { id: r.id, name: r.name, slug: r.slug, is_competition_lift: r.is_competition_lift }
    }
}

#[derive(sqlx::FromRow)]
struct PrescriptionRow {
    id: Uuid,
    lift_id: Uuid,
    load_strategy: Json<LoadStrategy>,
    set_scheme: Json<SetScheme>,
    order: i32,
}

impl From<PrescriptionRow> for Prescription {
    fn from(r: PrescriptionRow) -> Self {
        Prescription { id: r.id, lift_id: r.lift_id, load_strategy: r.load_strategy.0, set_scheme: r.set_scheme.0, order: r.order }
    }
}

#[async_trait]
impl Catalog for PostgresStore {
    async fn get_lift(&self, id: Uuid) -> KernelResult<Lift> {
        sqlx::query_as::<_, LiftRow>("SELECT id, name, slug, is_competition_lift FROM lifts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .map(Lift::from)
            .ok_or_else(|| KernelError::NotFound(format!("lift {id}")))
    }

    async fn create_lift(&self, input: CreateLift) -> KernelResult<Lift> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO lifts (id, name, slug, is_competition_lift) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(input.is_competition_lift)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(Lift { id, name: input.name, slug: input.slug, is_competition_lift: input.is_competition_lift })
    }

    async fn get_prescription(&self, id: Uuid) -> KernelResult<Prescription> {
        sqlx::query_as::<_, PrescriptionRow>(
            r#"SELECT id, lift_id, load_strategy, set_scheme, "order" FROM prescriptions WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .map(Prescription::from)
        .ok_or_else(|| KernelError::NotFound(format!("prescription {id}")))
    }

    async fn create_prescription(&self, input: CreatePrescription) -> KernelResult<Prescription> {
        let id = Uuid::new_v4();
        sqlx::query(r#"INSERT INTO prescriptions (id, lift_id, load_strategy, set_scheme, "order") VALUES ($1, $2, $3, $4, $5)"#)
            .bind(id)
            .bind(input.lift_id)
            .bind(Json(&input.load_strategy))
            .bind(Json(&input.set_scheme))
            .bind(input.order)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(Prescription { id, lift_id: input.lift_id, load_strategy: input.load_strategy, set_scheme: input.set_scheme, order: input.order })
    }

    async fn get_day(&self, id: Uuid) -> KernelResult<Day> {
        #[derive(sqlx::FromRow)]
        struct DayRow {
            id: Uuid,
            name: String,
            slug: String,
        }
        let row = sqlx::query_as::<_, DayRow>("SELECT id, name, slug FROM days WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or_else(|| KernelError::NotFound(format!("day {id}")))?;

        let prescriptions = sqlx::query_as::<_, PrescriptionRow>(
            r#"SELECT p.id, p.lift_id, p.load_strategy, p.set_scheme, p."order"
               FROM prescriptions p
               JOIN day_prescriptions dp ON dp.prescription_id = p.id
               WHERE dp.day_id = $1
               ORDER BY p."order""#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?
        .into_iter()
        .map(Prescription::from)
        .collect();

        Ok(Day { id: row.id, name: row.name, slug: row.slug, prescriptions })
    }

    async fn create_day(&self, input: CreateDay) -> KernelResult<Day> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await.map_err(db)?;
        sqlx::query("INSERT INTO days (id, name, slug) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&input.name)
            .bind(&input.slug)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        for prescription_id in &input.prescription_ids {
            sqlx::query("INSERT INTO day_prescriptions (day_id, prescription_id) VALUES ($1, $2)")
                .bind(id)
                .bind(prescription_id)
                .execute(&mut *tx)
                .await
                .map_err(db)?;
        }
        tx.commit().await.map_err(db)?;
        self.get_day(id).await
    }

    async fn get_week(&self, id: Uuid) -> KernelResult<Week> {
        #[derive(sqlx::FromRow)]
        struct WeekRow {
            id: Uuid,
            cycle_id: Uuid,
            week_number: i32,
        }
        let row = sqlx::query_as::<_, WeekRow>("SELECT id, cycle_id, week_number FROM weeks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or_else(|| KernelError::NotFound(format!("week {id}")))?;

        #[derive(sqlx::FromRow)]
        struct WeekDayRow {
            weekday_key: String,
            day_id: Uuid,
        }
        let day_ids = sqlx::query_as::<_, WeekDayRow>("SELECT weekday_key, day_id FROM week_days WHERE week_id = $1")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;

        let mut days = BTreeMap::new();
        for wd in day_ids {
            let day = self.get_day(wd.day_id).await?;
            days.insert(wd.weekday_key, day);
        }

        Ok(Week { id: row.id, cycle_id: row.cycle_id, week_number: row.week_number as u32, days })
    }

    async fn create_week(&self, input: CreateWeek) -> KernelResult<Week> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await.map_err(db)?;
        sqlx::query("INSERT INTO weeks (id, cycle_id, week_number) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(input.cycle_id)
            .bind(input.week_number as i32)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        for (key, day_id) in &input.days {
            sqlx::query("INSERT INTO week_days (week_id, weekday_key, day_id) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(key)
                .bind(day_id)
                .execute(&mut *tx)
                .await
                .map_err(db)?;
        }
        tx.commit().await.map_err(db)?;
        self.get_week(id).await
    }

    async fn get_cycle(&self, id: Uuid) -> KernelResult<Cycle> {
        #[derive(sqlx::FromRow)]
        struct CycleRow {
            id: Uuid,
            name: String,
            length_weeks: i32,
        }
        let row = sqlx::query_as::<_, CycleRow>("SELECT id, name, length_weeks FROM cycles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .ok_or_else(|| KernelError::NotFound(format!("cycle {id}")))?;

        let week_ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM weeks WHERE cycle_id = $1 ORDER BY week_number")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;

        let mut weeks = Vec::with_capacity(week_ids.len());
        for week_id in week_ids {
            weeks.push(self.get_week(week_id).await?);
        }

        Ok(Cycle { id: row.id, name: row.name, length_weeks: row.length_weeks as u32, weeks })
    }

    async fn create_cycle(&self, input: CreateCycle) -> KernelResult<Cycle> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO cycles (id, name, length_weeks) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&input.name)
            .bind(input.length_weeks as i32)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(Cycle { id, name: input.name, length_weeks: input.length_weeks, weeks: Vec::new() })
    }

    async fn attach_week(&self, cycle_id: Uuid, week_id: Uuid) -> KernelResult<Cycle> {
        let week = self.get_week(week_id).await?;
        let cycle = self.get_cycle(cycle_id).await?;
        if week.week_number < 1 || week.week_number > cycle.length_weeks {
            return Err(KernelError::Validation("weekNumber out of range for cycle".into()));
        }
        if week.cycle_id != cycle_id {
            sqlx::query("UPDATE weeks SET cycle_id = $1 WHERE id = $2")
                .bind(cycle_id)
                .bind(week_id)
                .execute(&self.pool)
                .await
                .map_err(db)?;
        }
        self.get_cycle(cycle_id).await
    }

    async fn get_program(&self, id: Uuid) -> KernelResult<Program> {
        sqlx::query_as::<_, ProgramRow>(
            "SELECT id, name, slug, cycle_id, weekly_lookup_id, daily_lookup_id, default_rounding, difficulty, days_per_week, focus, has_amrap, taper_enabled FROM programs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .map(Program::from)
        .ok_or_else(|| KernelError::NotFound(format!("program {id}")))
    }

    async fn get_program_by_slug(&self, slug: &str) -> KernelResult<Program> {
        sqlx::query_as::<_, ProgramRow>(
            "SELECT id, name, slug, cycle_id, weekly_lookup_id, daily_lookup_id, default_rounding, difficulty, days_per_week, focus, has_amrap, taper_enabled FROM programs WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .map(Program::from)
        .ok_or_else(|| KernelError::NotFound(format!("program {slug}")))
    }

    async fn create_program(&self, input: CreateProgram) -> KernelResult<Program> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO programs
               (id, name, slug, cycle_id, weekly_lookup_id, daily_lookup_id, default_rounding, difficulty, days_per_week, focus, has_amrap, taper_enabled)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.cycle_id)
        .bind(input.weekly_lookup_id)
        .bind(input.daily_lookup_id)
        .bind(input.default_rounding)
        .bind(&input.difficulty)
        .bind(input.days_per_week as i32)
        .bind(&input.focus)
        .bind(input.has_amrap)
        .bind(input.taper_enabled)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        Ok(Program {
            id,
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
        })
    }

    async fn list_programs(&self, filter: &ProgramFilter) -> KernelResult<Page<Program>> {
        let rows = sqlx::query_as::<_, ProgramRow>(
            "SELECT id, name, slug, cycle_id, weekly_lookup_id, daily_lookup_id, default_rounding, difficulty, days_per_week, focus, has_amrap, taper_enabled FROM programs",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let mut matching: Vec<Program> = rows.into_iter().map(Program::from).filter(|p| filter.matches(p)).collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        let total = matching.len() as i64;
        let (limit, offset) = (filter.limit(), filter.offset());
        let items = matching.into_iter().skip(offset as usize).take(limit as usize).collect();
        Ok(Page::new(items, total, limit, offset))
    }

    async fn get_daily_lookup(&self, id: Uuid) -> KernelResult<DailyLookup> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: Uuid,
            entries: Json<Vec<DailyLookupEntry>>,
        }
        sqlx::query_as::<_, Row>("SELECT id, entries FROM daily_lookups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .map(|r| DailyLookup { id: r.id, entries: r.entries.0 })
            .ok_or_else(|| KernelError::NotFound(format!("daily lookup {id}")))
    }

    async fn create_daily_lookup(&self, input: CreateDailyLookup) -> KernelResult<DailyLookup> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO daily_lookups (id, entries) VALUES ($1, $2)")
            .bind(id)
            .bind(Json(&input.entries))
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(DailyLookup { id, entries: input.entries })
    }

    async fn get_weekly_lookup(&self, id: Uuid) -> KernelResult<WeeklyLookup> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: Uuid,
            entries: Json<Vec<WeeklyLookupEntry>>,
        }
        sqlx::query_as::<_, Row>("SELECT id, entries FROM weekly_lookups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .map(|r| WeeklyLookup { id: r.id, entries: r.entries.0 })
            .ok_or_else(|| KernelError::NotFound(format!("weekly lookup {id}")))
    }

    async fn create_weekly_lookup(&self, input: CreateWeeklyLookup) -> KernelResult<WeeklyLookup> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO weekly_lookups (id, entries) VALUES ($1, $2)")
            .bind(id)
            .bind(Json(&input.entries))
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(WeeklyLookup { id, entries: input.entries })
    }

    async fn get_progression_definition(&self, id: Uuid) -> KernelResult<ProgressionDefinition> {
        let row: Option<Json<ProgressionDefinition>> =
            sqlx::query_scalar("SELECT definition FROM progression_definitions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db)?;
        row.map(|j| j.0).ok_or_else(|| KernelError::NotFound(format!("progression {id}")))
    }

    async fn create_progression_definition(
        &self,
        input: CreateProgressionDefinition,
    ) -> KernelResult<(Uuid, ProgressionDefinition)> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO progression_definitions (id, definition) VALUES ($1, $2)")
            .bind(id)
            .bind(Json(&input.definition))
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok((id, input.definition))
    }

    async fn create_program_progression_link(
        &self,
        input: CreateProgramProgressionLink,
    ) -> KernelResult<ProgramProgressionLink> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO program_progression_links (id, program_id, progression_id, lift_id, "order")
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(id)
        .bind(input.program_id)
        .bind(input.progression_id)
        .bind(input.lift_id)
        .bind(input.order)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref dbe) if dbe.is_unique_violation() => {
                KernelError::Validation("lift already linked to a progression in this program".into())
            }
            other => db(other),
        })?;
        Ok(ProgramProgressionLink { id, program_id: input.program_id, progression_id: input.progression_id, lift_id: input.lift_id, order: input.order })
    }

    async fn links_for_program(&self, program_id: Uuid) -> KernelResult<Vec<ProgramProgressionLink>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: Uuid,
            program_id: Uuid,
            progression_id: Uuid,
            lift_id: Uuid,
            order: i32,
        }
        Ok(sqlx::query_as::<_, Row>(
            r#"SELECT id, program_id, progression_id, lift_id, "order" FROM program_progression_links WHERE program_id = $1"#,
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?
        .into_iter()
        .map(|r| ProgramProgressionLink { id: r.id, program_id: r.program_id, progression_id: r.progression_id, lift_id: r.lift_id, order: r.order })
        .collect())
    }
}

#[derive(sqlx::FromRow)]
struct ProgramRow {
    id: Uuid,
    name: String,
    slug: String,
    cycle_id: Uuid,
    weekly_lookup_id: Option<Uuid>,
    daily_lookup_id: Option<Uuid>,
    default_rounding: Option<f64>,
    difficulty: String,
    days_per_week: i32,
    focus: String,
    has_amrap: bool,
    taper_enabled: bool,
}

impl From<ProgramRow> for Program {
    fn from(r: ProgramRow) -> Self {
        Program {
            id: r.id,
            name: r.name,
            slug: r.slug,
            cycle_id: r.cycle_id,
            weekly_lookup_id: r.weekly_lookup_id,
            daily_lookup_id: r.daily_lookup_id,
            default_rounding: r.default_rounding,
            difficulty: r.difficulty,
            days_per_week: r.days_per_week as u32,
            focus: r.focus,
            has_amrap: r.has_amrap,
            taper_enabled: r.taper_enabled,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LiftMaxRow {
    id: Uuid,
    lifter_id: Uuid,
    lift_id: Uuid,
    max_type: String,
    value: f64,
    created_at: DateTime<Utc>,
}

impl LiftMaxRow {
    fn into_domain(self) -> KernelResult<LiftMax> {
        Ok(LiftMax {
            id: self.id,
            lifter_id: self.lifter_id,
            lift_id: self.lift_id,
            max_type: text_to_enum(&self.max_type)?,
            value: self.value,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl LiftMaxStore for PostgresStore {
    async fn record_max(&self, lifter_id: Uuid, lift_id: Uuid, max_type: MaxType, value: f64, at: DateTime<Utc>) -> KernelResult<LiftMax> {
        let id = Uuid::new_v4();
        let max_type_str = enum_to_text(&max_type)?;
        sqlx::query("INSERT INTO lift_maxes (id, lifter_id, lift_id, max_type, value, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(id)
            .bind(lifter_id)
            .bind(lift_id)
            .bind(&max_type_str)
            .bind(value)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(LiftMax { id, lifter_id, lift_id, max_type, value, created_at: at })
    }

    async fn current_max(&self, lifter_id: Uuid, lift_id: Uuid, max_type: MaxType) -> KernelResult<Option<LiftMax>> {
        let max_type_str = enum_to_text(&max_type)?;
        sqlx::query_as::<_, LiftMaxRow>(
            "SELECT id, lifter_id, lift_id, max_type, value, created_at FROM lift_maxes
             WHERE lifter_id = $1 AND lift_id = $2 AND max_type = $3
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(lifter_id)
        .bind(lift_id)
        .bind(&max_type_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .map(LiftMaxRow::into_domain)
        .transpose()
    }
}

#[derive(sqlx::FromRow)]
struct EnrollmentRow {
    lifter_id: Uuid,
    program_id: Uuid,
    enrollment_status: String,
    cycle_status: String,
    week_status: String,
    current_week: i32,
    current_day_key: String,
    cycle_iteration: i32,
    meet_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EnrollmentRow {
    fn into_domain(self) -> KernelResult<Enrollment> {
        Ok(Enrollment {
            lifter_id: self.lifter_id,
            program_id: self.program_id,
            enrollment_status: text_to_enum(&self.enrollment_status)?,
            cycle_status: text_to_enum(&self.cycle_status)?,
            week_status: text_to_enum(&self.week_status)?,
            current_week: self.current_week as u32,
            current_day_key: self.current_day_key,
            cycle_iteration: self.cycle_iteration as u32,
            meet_date: self.meet_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// `StateMachine` calls are the sole writer here; this store performs the
/// per-lifter `SELECT ... FOR UPDATE` row lock spec.md §5 requires by
/// selecting the current row before `put` replaces it within the caller's
/// transaction boundary at the service layer.
#[async_trait]
impl EnrollmentStore for PostgresStore {
    async fn get(&self, lifter_id: Uuid) -> KernelResult<Option<Enrollment>> {
        sqlx::query_as::<_, EnrollmentRow>(
            "SELECT lifter_id, program_id, enrollment_status, cycle_status, week_status, current_week, current_day_key, cycle_iteration, meet_date, created_at, updated_at
             FROM enrollments WHERE lifter_id = $1",
        )
        .bind(lifter_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .map(EnrollmentRow::into_domain)
        .transpose()
    }

    async fn put(&self, enrollment: Enrollment) -> KernelResult<Enrollment> {
        sqlx::query(
            "INSERT INTO enrollments (lifter_id, program_id, enrollment_status, cycle_status, week_status, current_week, current_day_key, cycle_iteration, meet_date, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             ON CONFLICT (lifter_id) DO UPDATE SET
               program_id = EXCLUDED.program_id,
               enrollment_status = EXCLUDED.enrollment_status,
               cycle_status = EXCLUDED.cycle_status,
               week_status = EXCLUDED.week_status,
               current_week = EXCLUDED.current_week,
               current_day_key = EXCLUDED.current_day_key,
               cycle_iteration = EXCLUDED.cycle_iteration,
               meet_date = EXCLUDED.meet_date,
               updated_at = EXCLUDED.updated_at",
        )
        .bind(enrollment.lifter_id)
        .bind(enrollment.program_id)
        .bind(enum_to_text(&enrollment.enrollment_status)?)
        .bind(enum_to_text(&enrollment.cycle_status)?)
        .bind(enum_to_text(&enrollment.week_status)?)
        .bind(enrollment.current_week as i32)
        .bind(&enrollment.current_day_key)
        .bind(enrollment.cycle_iteration as i32)
        .bind(enrollment.meet_date)
        .bind(enrollment.created_at)
        .bind(enrollment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(enrollment)
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    lifter_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    status: String,
    week_number: i32,
    cycle_iteration: i32,
    day_key: String,
}

impl SessionRow {
    fn into_domain(self) -> KernelResult<WorkoutSession> {
        Ok(WorkoutSession {
            id: self.id,
            lifter_id: self.lifter_id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            status: text_to_enum(&self.status)?,
            week_number: self.week_number as u32,
            cycle_iteration: self.cycle_iteration as u32,
            day_key: self.day_key,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LoggedSetRow {
    id: Uuid,
    session_id: Uuid,
    prescription_id: Uuid,
    lift_id: Uuid,
    set_number: i32,
    weight: f64,
    target_reps: i32,
    reps_performed: i32,
    is_amrap: bool,
}

impl From<LoggedSetRow> for LoggedSet {
    fn from(r: LoggedSetRow) -> Self {
        LoggedSet {
            id: r.id,
            session_id: r.session_id,
            prescription_id: r.prescription_id,
            lift_id: r.lift_id,
            set_number: r.set_number as u32,
            weight: r.weight,
            target_reps: r.target_reps as u32,
            reps_performed: r.reps_performed as u32,
            is_amrap: r.is_amrap,
        }
    }
}

#[async_trait]
impl SessionStore for PostgresStore {
    async fn create_session(&self, session: WorkoutSession) -> KernelResult<WorkoutSession> {
        sqlx::query(
            "INSERT INTO workout_sessions (id, lifter_id, started_at, finished_at, status, week_number, cycle_iteration, day_key)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(session.id)
        .bind(session.lifter_id)
        .bind(session.started_at)
        .bind(session.finished_at)
        .bind(enum_to_text(&session.status)?)
        .bind(session.week_number as i32)
        .bind(session.cycle_iteration as i32)
        .bind(&session.day_key)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref dbe) if dbe.is_unique_violation() => KernelError::SessionAlreadyOpen,
            other => db(other),
        })?;
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> KernelResult<Option<WorkoutSession>> {
        sqlx::query_as::<_, SessionRow>(
            "SELECT id, lifter_id, started_at, finished_at, status, week_number, cycle_iteration, day_key FROM workout_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .map(SessionRow::into_domain)
        .transpose()
    }

    async fn put_session(&self, session: WorkoutSession) -> KernelResult<WorkoutSession> {
        sqlx::query(
            "UPDATE workout_sessions SET finished_at = $2, status = $3 WHERE id = $1",
        )
        .bind(session.id)
        .bind(session.finished_at)
        .bind(enum_to_text(&session.status)?)
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(session)
    }

    async fn in_progress_session(&self, lifter_id: Uuid) -> KernelResult<Option<WorkoutSession>> {
        sqlx::query_as::<_, SessionRow>(
            "SELECT id, lifter_id, started_at, finished_at, status, week_number, cycle_iteration, day_key FROM workout_sessions
             WHERE lifter_id = $1 AND status = 'IN_PROGRESS'",
        )
        .bind(lifter_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .map(SessionRow::into_domain)
        .transpose()
    }

    async fn recent_sessions(&self, lifter_id: Uuid, limit: i64) -> KernelResult<Vec<WorkoutSession>> {
        Ok(sqlx::query_as::<_, SessionRow>(
            "SELECT id, lifter_id, started_at, finished_at, status, week_number, cycle_iteration, day_key FROM workout_sessions
             WHERE lifter_id = $1 ORDER BY started_at DESC LIMIT $2",
        )
        .bind(lifter_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?
        .into_iter()
        .map(SessionRow::into_domain)
        .collect::<KernelResult<Vec<_>>>()?)
    }

    async fn append_set(&self, set: LoggedSet) -> KernelResult<LoggedSet> {
        sqlx::query(
            "INSERT INTO logged_sets (id, session_id, prescription_id, lift_id, set_number, weight, target_reps, reps_performed, is_amrap)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(set.id)
        .bind(set.session_id)
        .bind(set.prescription_id)
        .bind(set.lift_id)
        .bind(set.set_number as i32)
        .bind(set.weight)
        .bind(set.target_reps as i32)
        .bind(set.reps_performed as i32)
        .bind(set.is_amrap)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref dbe) if dbe.is_unique_violation() => KernelError::DuplicateSet,
            other => db(other),
        })?;
        Ok(set)
    }

    async fn sets_for_session(&self, session_id: Uuid) -> KernelResult<Vec<LoggedSet>> {
        Ok(sqlx::query_as::<_, LoggedSetRow>(
            "SELECT id, session_id, prescription_id, lift_id, set_number, weight, target_reps, reps_performed, is_amrap
             FROM logged_sets WHERE session_id = $1 ORDER BY logged_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?
        .into_iter()
        .map(LoggedSet::from)
        .collect())
    }

    async fn get_progression_state(&self, lifter_id: Uuid, progression_id: Uuid, lift_id: Uuid) -> KernelResult<Option<ProgressionState>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            failure_count: i32,
            current_stage: i32,
            last_applied_at: Option<DateTime<Utc>>,
            applied_in_sessions: Vec<Uuid>,
        }
        Ok(sqlx::query_as::<_, Row>(
            "SELECT failure_count, current_stage, last_applied_at, applied_in_sessions FROM progression_states
             WHERE lifter_id = $1 AND progression_id = $2 AND lift_id = $3",
        )
        .bind(lifter_id)
        .bind(progression_id)
        .bind(lift_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?
        .map(|r| ProgressionState {
            lifter_id,
            progression_id,
            lift_id,
            failure_count: r.failure_count as u32,
            current_stage: r.current_stage as usize,
            last_applied_at: r.last_applied_at,
            applied_in_sessions: r.applied_in_sessions.into_iter().collect(),
        }))
    }

    async fn put_progression_state(&self, state: ProgressionState) -> KernelResult<ProgressionState> {
        let sessions: Vec<Uuid> = state.applied_in_sessions.iter().copied().collect();
        sqlx::query(
            "INSERT INTO progression_states (lifter_id, progression_id, lift_id, failure_count, current_stage, last_applied_at, applied_in_sessions)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (lifter_id, progression_id, lift_id) DO UPDATE SET
               failure_count = EXCLUDED.failure_count,
               current_stage = EXCLUDED.current_stage,
               last_applied_at = EXCLUDED.last_applied_at,
               applied_in_sessions = EXCLUDED.applied_in_sessions",
        )
        .bind(state.lifter_id)
        .bind(state.progression_id)
        .bind(state.lift_id)
        .bind(state.failure_count as i32)
        .bind(state.current_stage as i32)
        .bind(state.last_applied_at)
        .bind(&sessions)
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(state)
    }
}
