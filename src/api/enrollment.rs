//! Enrollment lifecycle endpoints: enroll/unenroll/read, AdvanceDay,
//! AdvanceWeek, StartNextCycle, SetMeetDate (spec.md §4.7, §6).

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::envelope::Envelope;
use crate::api::error::HandlerError;
use crate::api::state::AppState;
use crate::auth::models::Principal;
use crate::kernel::ports::{EnrollmentStore, Store};
use crate::kernel::state_machine::StateMachine;
use crate::models::Enrollment;

fn state_machine<S: Store + 'static>(state: &AppState<S>) -> StateMachine<'_> {
    StateMachine::new(
        state.store.as_ref(),
        state.store.as_ref(),
        state.store.as_ref(),
        state.store.as_ref(),
        state.clock.as_ref(),
    )
}

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub program_id: Uuid,
}

pub async fn enroll<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(lifter_id): Path<Uuid>,
    principal: Principal,
    Json(input): Json<EnrollRequest>,
) -> Result<Envelope<Enrollment>, HandlerError> {
    principal.require_owner(lifter_id)?;
    let enrollment = state_machine(&state).enroll(lifter_id, input.program_id, state.now()).await?;
    Ok(Envelope::created(enrollment))
}

pub async fn unenroll<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(lifter_id): Path<Uuid>,
    principal: Principal,
) -> Result<Envelope<Enrollment>, HandlerError> {
    principal.require_owner(lifter_id)?;
    let enrollment = state_machine(&state).unenroll(lifter_id, state.now()).await?;
    Ok(Envelope::ok(enrollment))
}

pub async fn get_enrollment<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(lifter_id): Path<Uuid>,
    principal: Principal,
) -> Result<Envelope<Option<Enrollment>>, HandlerError> {
    principal.require_owner(lifter_id)?;
    let enrollment = state.store.get(lifter_id).await?;
    Ok(Envelope::ok(enrollment))
}

pub async fn advance_day<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(lifter_id): Path<Uuid>,
    principal: Principal,
) -> Result<Envelope<Enrollment>, HandlerError> {
    principal.require_owner(lifter_id)?;
    let enrollment = state_machine(&state).advance_day(lifter_id, state.now()).await?;
    Ok(Envelope::ok(enrollment))
}

pub async fn advance_week<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(lifter_id): Path<Uuid>,
    principal: Principal,
) -> Result<Envelope<Enrollment>, HandlerError> {
    principal.require_owner(lifter_id)?;
    let enrollment = state_machine(&state).advance_week(lifter_id, state.now()).await?;
    Ok(Envelope::ok(enrollment))
}

pub async fn start_next_cycle<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(lifter_id): Path<Uuid>,
    principal: Principal,
) -> Result<Envelope<Enrollment>, HandlerError> {
    principal.require_owner(lifter_id)?;
    let enrollment = state_machine(&state).start_next_cycle(lifter_id, state.now()).await?;
    Ok(Envelope::ok(enrollment))
}

#[derive(Debug, Deserialize)]
pub struct SetMeetDateRequest {
    pub meet_date: Option<NaiveDate>,
}

pub async fn set_meet_date<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path((lifter_id, _program_id)): Path<(Uuid, Uuid)>,
    principal: Principal,
    Json(input): Json<SetMeetDateRequest>,
) -> Result<Envelope<Enrollment>, HandlerError> {
    principal.require_owner(lifter_id)?;
    let enrollment = state_machine(&state).set_meet_date(lifter_id, input.meet_date, state.now()).await?;
    Ok(Envelope::ok(enrollment))
}
