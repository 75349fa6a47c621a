//! Dashboard / recent-workout reporting (SPEC_FULL.md §4 "[SUPPLEMENT]
//! Dashboard / recent-workout reporting"). Owner-only per spec.md §9's
//! explicit design note — admins are intentionally denied here.

use axum::extract::{Path, State};
use serde::Serialize;
use uuid::Uuid;

use crate::api::envelope::Envelope;
use crate::api::error::HandlerError;
use crate::api::state::AppState;
use crate::auth::models::Principal;
use crate::kernel::error::KernelError;
use crate::kernel::phase::{self, PhaseInfo};
use crate::kernel::ports::{Catalog, EnrollmentStore, SessionStore, Store};
use crate::models::{Enrollment, WorkoutSession};

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub enrollment: Enrollment,
    pub program_name: String,
    pub phase: PhaseInfo,
    pub recent_sessions: Vec<WorkoutSession>,
}

pub async fn get_dashboard<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(lifter_id): Path<Uuid>,
    principal: Principal,
) -> Result<Envelope<Dashboard>, HandlerError> {
    principal.require_owner(lifter_id)?;

    let enrollment = state.store.get(lifter_id).await?.ok_or(KernelError::NotEnrolled)?;
    let program = state.store.get_program(enrollment.program_id).await?;
    let phase_info = phase::resolve(enrollment.meet_date, state.today());
    let recent_sessions = state.store.recent_sessions(lifter_id, 10).await?;

    Ok(Envelope::ok(Dashboard {
        enrollment,
        program_name: program.name,
        phase: phase_info,
        recent_sessions,
    }))
}
