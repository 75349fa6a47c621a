//! Logging sets against the active session (spec.md §4.5, §6).

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::envelope::Envelope;
use crate::api::error::HandlerError;
use crate::api::state::AppState;
use crate::auth::models::Principal;
use crate::kernel::error::KernelError;
use crate::kernel::ports::{EnrollmentStore, SessionStore, Store};
use crate::kernel::projector::WorkoutProjector;
use crate::kernel::set_logger::SetLogger;
use crate::models::{LogSetInput, LoggedSet};

pub async fn log_sets<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(session_id): Path<Uuid>,
    principal: Principal,
    Json(inputs): Json<Vec<LogSetInput>>,
) -> Result<Envelope<Vec<LoggedSet>>, HandlerError> {
    let session = state
        .store
        .get_session(session_id)
        .await?
        .ok_or_else(|| KernelError::NotFound(format!("session {session_id}")))?;
    principal.require_owner(session.lifter_id)?;

    let enrollment = state
        .store
        .get(session.lifter_id)
        .await?
        .ok_or(KernelError::NotEnrolled)?;

    // The session may have been logged against an earlier week/day than
    // the lifter's *current* position, so project from the session's own
    // pointer rather than the enrollment's live one.
    let mut projection_enrollment = enrollment;
    projection_enrollment.current_week = session.week_number;
    projection_enrollment.current_day_key = session.day_key.clone();

    let projector = WorkoutProjector::new(state.store.as_ref(), state.store.as_ref(), state.store.as_ref());
    let workout = projector.current_workout(&projection_enrollment, state.today()).await?;

    let logger = SetLogger::new(state.store.as_ref());
    let persisted = logger.log_sets(&session, &workout, inputs).await?;
    Ok(Envelope::created(persisted))
}

pub async fn list_sets<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(session_id): Path<Uuid>,
    principal: Principal,
) -> Result<Envelope<Vec<LoggedSet>>, HandlerError> {
    let session = state
        .store
        .get_session(session_id)
        .await?
        .ok_or_else(|| KernelError::NotFound(format!("session {session_id}")))?;
    principal.require_owner(session.lifter_id)?;
    let sets = state.store.sets_for_session(session_id).await?;
    Ok(Envelope::ok(sets))
}
