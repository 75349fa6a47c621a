//! Workout projection and session lifecycle (spec.md §4.4, §4.7, §6).

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::api::envelope::Envelope;
use crate::api::error::HandlerError;
use crate::api::state::AppState;
use crate::auth::models::Principal;
use crate::kernel::error::KernelError;
use crate::kernel::ports::{EnrollmentStore, SessionStore, Store};
use crate::kernel::projector::{Workout, WorkoutProjector};
use crate::kernel::state_machine::StateMachine;
use crate::models::WorkoutSession;

fn projector<S: Store + 'static>(state: &AppState<S>) -> WorkoutProjector<'_> {
    WorkoutProjector::new(state.store.as_ref(), state.store.as_ref(), state.store.as_ref())
}

fn state_machine<S: Store + 'static>(state: &AppState<S>) -> StateMachine<'_> {
    StateMachine::new(
        state.store.as_ref(),
        state.store.as_ref(),
        state.store.as_ref(),
        state.store.as_ref(),
        state.clock.as_ref(),
    )
}

/// `GET /users/{id}/workout`: idempotent and read-only, per spec.md §4.4.
pub async fn current_workout<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(lifter_id): Path<Uuid>,
    principal: Principal,
) -> Result<Envelope<Workout>, HandlerError> {
    principal.require_owner(lifter_id)?;
    let enrollment = state.store.get(lifter_id).await?.ok_or(KernelError::NotEnrolled)?;
    let workout = projector(&state).current_workout(&enrollment, state.today()).await?;
    Ok(Envelope::ok(workout))
}

/// `POST /workouts/start`: always starts a session for the caller, never on
/// behalf of another lifter.
pub async fn start_session<S: Store + 'static>(
    State(state): State<AppState<S>>,
    principal: Principal,
) -> Result<Envelope<WorkoutSession>, HandlerError> {
    let session = state_machine(&state).start_session(principal.user_id, state.now()).await?;
    Ok(Envelope::created(session))
}

async fn require_session_owner<S: Store + 'static>(
    state: &AppState<S>,
    principal: &Principal,
    session_id: Uuid,
) -> Result<WorkoutSession, HandlerError> {
    let session = state
        .store
        .get_session(session_id)
        .await?
        .ok_or_else(|| KernelError::NotFound(format!("session {session_id}")))?;
    principal.require_owner(session.lifter_id)?;
    Ok(session)
}

pub async fn get_session<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(session_id): Path<Uuid>,
    principal: Principal,
) -> Result<Envelope<WorkoutSession>, HandlerError> {
    let session = require_session_owner(&state, &principal, session_id).await?;
    Ok(Envelope::ok(session))
}

pub async fn finish_session<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(session_id): Path<Uuid>,
    principal: Principal,
) -> Result<Envelope<WorkoutSession>, HandlerError> {
    require_session_owner(&state, &principal, session_id).await?;
    let session = state_machine(&state).finish_session(session_id, state.now()).await?;
    Ok(Envelope::ok(session))
}

pub async fn abandon_session<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(session_id): Path<Uuid>,
    principal: Principal,
) -> Result<Envelope<WorkoutSession>, HandlerError> {
    require_session_owner(&state, &principal, session_id).await?;
    let session = state_machine(&state).abandon_session(session_id, state.now()).await?;
    Ok(Envelope::ok(session))
}
