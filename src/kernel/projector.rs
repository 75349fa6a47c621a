//! WorkoutProjector (spec.md §4.4): finds the lifter's current day within
//! the cycle and invokes the evaluator for each prescription.

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::kernel::error::{KernelError, KernelResult};
use crate::kernel::evaluator::{self, LifterContext, PrescribedSet};
use crate::kernel::phase;
use crate::kernel::ports::{Catalog, LiftMaxStore, SessionStore};
use crate::models::*;

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutExercise {
    pub lift_id: Uuid,
    pub prescription_id: Uuid,
    pub sets: Vec<PrescribedSet>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Workout {
    pub week_number: u32,
    pub day_key: String,
    pub day_slug: String,
    pub cycle_iteration: u32,
    pub exercises: Vec<WorkoutExercise>,
}

pub struct WorkoutProjector<'a> {
    pub catalog: &'a dyn Catalog,
    pub lift_maxes: &'a dyn LiftMaxStore,
    pub sessions: &'a dyn SessionStore,
}

impl<'a> WorkoutProjector<'a> {
    pub fn new(catalog: &'a dyn Catalog, lift_maxes: &'a dyn LiftMaxStore, sessions: &'a dyn SessionStore) -> Self {
        Self { catalog, lift_maxes, sessions }
    }

    /// `currentWorkout(lifter) -> Workout`. Idempotent and read-only: calling
    /// repeatedly before any state advance returns the same projection.
    pub async fn current_workout(&self, enrollment: &Enrollment, now_date: chrono::NaiveDate) -> KernelResult<Workout> {
        if enrollment.enrollment_status == EnrollmentStatus::Quit {
            return Err(KernelError::NotEnrolled);
        }
        if enrollment.enrollment_status == EnrollmentStatus::BetweenCycles {
            return Err(KernelError::InvalidEnrollmentState("between cycles".into()));
        }

        let program = self.catalog.get_program(enrollment.program_id).await?;
        let cycle = self.catalog.get_cycle(program.cycle_id).await?;
        let week = cycle
            .weeks
            .iter()
            .find(|w| w.week_number == enrollment.current_week)
            .ok_or_else(|| KernelError::NotFound(format!("week {}", enrollment.current_week)))?;
        let day = week
            .days
            .get(&enrollment.current_day_key)
            .ok_or_else(|| KernelError::NotFound(format!("day {}", enrollment.current_day_key)))?;

        let daily_lookup = match program.daily_lookup_id {
            Some(id) => Some(self.catalog.get_daily_lookup(id).await?),
            None => None,
        };
        let weekly_lookup = match program.weekly_lookup_id {
            Some(id) => Some(self.catalog.get_weekly_lookup(id).await?),
            None => None,
        };
        let phase_info = phase::resolve(enrollment.meet_date, now_date);

        let links = self.catalog.links_for_program(program.id).await?;
        let mut stage_defs: HashMap<Uuid, (Uuid, ProgressionDefinition)> = HashMap::new();
        for link in &links {
            let def = self.catalog.get_progression_definition(link.progression_id).await?;
            if matches!(def, ProgressionDefinition::StageProgression { .. }) {
                stage_defs.insert(link.lift_id, (link.progression_id, def));
            }
        }

        // Prefetch every max and stage-state the day's prescriptions need so
        // the evaluator's closures stay synchronous.
        let mut max_cache: HashMap<(Uuid, MaxType), f64> = HashMap::new();
        let mut stage_cache: HashMap<Uuid, (ProgressionDefinition, usize)> = HashMap::new();
        for prescription in &day.prescriptions {
            let LoadStrategy::PercentOf { reference_type, .. } = prescription.load_strategy;
            if let Some(max) = self
                .lift_maxes
                .current_max(enrollment.lifter_id, prescription.lift_id, reference_type)
                .await?
            {
                max_cache.insert((prescription.lift_id, reference_type), max.value);
            }
            if matches!(prescription.set_scheme, SetScheme::Stage) {
                if let Some((progression_id, def)) = stage_defs.get(&prescription.lift_id) {
                    let default_stage = match def {
                        ProgressionDefinition::StageProgression { current_stage, .. } => *current_stage,
                        _ => 0,
                    };
                    let stage = self
                        .sessions
                        .get_progression_state(enrollment.lifter_id, *progression_id, prescription.lift_id)
                        .await?
                        .map(|s| s.current_stage)
                        .unwrap_or(default_stage);
                    stage_cache.insert(prescription.lift_id, (def.clone(), stage));
                }
            }
        }

        let max_lookup = |lift: Uuid, mt: MaxType| max_cache.get(&(lift, mt)).copied();
        let stage_lookup = |lift: Uuid| stage_cache.get(&lift).cloned();

        let mut exercises = Vec::with_capacity(day.prescriptions.len());
        for prescription in &day.prescriptions {
            let ctx = LifterContext {
                lifter_id: enrollment.lifter_id,
                program: &program,
                daily_lookup: daily_lookup.as_ref(),
                weekly_lookup: weekly_lookup.as_ref(),
                week_number: enrollment.current_week,
                day_slug: &day.slug,
                phase_info,
                apply_taper: program.taper_enabled,
                max_lookup: &max_lookup,
                stage_lookup: &stage_lookup,
            };
            let sets = evaluator::evaluate(prescription, &ctx)?;
            exercises.push(WorkoutExercise { lift_id: prescription.lift_id, prescription_id: prescription.id, sets });
        }

        Ok(Workout {
            week_number: enrollment.current_week,
            day_key: enrollment.current_day_key.clone(),
            day_slug: day.slug.clone(),
            cycle_iteration: enrollment.cycle_iteration,
            exercises,
        })
    }
}
