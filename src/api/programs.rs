//! Program discovery & detail (SPEC_FULL.md §4 "[SUPPLEMENT] Program
//! discovery & detail").

use axum::extract::{Path, Query, State};
use uuid::Uuid;

use crate::api::envelope::Envelope;
use crate::api::error::HandlerError;
use crate::api::state::AppState;
use crate::kernel::ports::{Catalog, Store};
use crate::models::*;

pub async fn list_programs<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Query(filter): Query<ProgramFilter>,
) -> Result<Envelope<Page<Program>>, HandlerError> {
    let page = state.store.list_programs(&filter).await?;
    Ok(Envelope::ok(page))
}

/// One line per scheduled day of the program's first week, each exercise
/// named by lift (not prescription detail) — intentionally a preview, not
/// a full projection, since no lifter context (maxes) exists yet.
pub async fn get_program_detail<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Envelope<ProgramDetail>, HandlerError> {
    let program = state.store.get_program(id).await?;
    let cycle = state.store.get_cycle(program.cycle_id).await?;

    let week1 = cycle.weeks.iter().find(|w| w.week_number == 1);

    let mut sample_week = Vec::new();
    let mut lift_ids: std::collections::BTreeSet<Uuid> = std::collections::BTreeSet::new();
    let mut estimated_minutes = 0u32;

    if let Some(week) = week1 {
        for (_, day) in week.days.iter() {
            let mut lifts = Vec::new();
            for prescription in &day.prescriptions {
                if let Ok(lift) = state.store.get_lift(prescription.lift_id).await {
                    lifts.push(lift.name.clone());
                    lift_ids.insert(lift.id);
                }
                estimated_minutes += estimated_minutes_for(&prescription.set_scheme);
            }
            sample_week.push(SampleWeekDay {
                day_name: day.name.clone(),
                day_slug: day.slug.clone(),
                lifts,
            });
        }
    }

    let mut lift_requirements = Vec::new();
    for lift_id in &lift_ids {
        if let Ok(lift) = state.store.get_lift(*lift_id).await {
            lift_requirements.push(lift.name);
        }
    }
    lift_requirements.sort();

    Ok(Envelope::ok(ProgramDetail {
        program,
        sample_week,
        lift_requirements,
        estimated_session_minutes: estimated_minutes,
    }))
}

/// ~90s/set, plus a flat 5-minute warm-up tax per exercise — a coarse
/// estimate, not a claim about any particular lifter's pace.
fn estimated_minutes_for(scheme: &SetScheme) -> u32 {
    let sets = match scheme {
        SetScheme::Fixed { sets, .. } => *sets,
        SetScheme::Amrap { sets, .. } => *sets,
        SetScheme::Greyskull { fixed_sets, amrap_sets, .. } => fixed_sets + amrap_sets,
        SetScheme::Stage => 3,
    };
    5 + (sets * 90) / 60
}
