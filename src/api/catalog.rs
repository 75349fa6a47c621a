//! Admin template CRUD (spec.md §6 minimum surface; SPEC_FULL.md §4
//! "[SUPPLEMENT] Admin template CRUD"). Thin `Catalog`-trait-backed create
//! operations — no kernel logic, just validation and a store call.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::envelope::Envelope;
use crate::api::error::HandlerError;
use crate::api::state::AppState;
use crate::auth::models::Principal;
use crate::kernel::ports::{Catalog, Store};
use crate::models::*;

pub async fn create_lift<S: Store + 'static>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(input): Json<CreateLift>,
) -> Result<Envelope<Lift>, HandlerError> {
    principal.require_admin()?;
    let lift = state.store.create_lift(input).await?;
    Ok(Envelope::created(lift))
}

pub async fn create_prescription<S: Store + 'static>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(input): Json<CreatePrescription>,
) -> Result<Envelope<Prescription>, HandlerError> {
    principal.require_admin()?;
    let prescription = state.store.create_prescription(input).await?;
    Ok(Envelope::created(prescription))
}

pub async fn create_day<S: Store + 'static>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(input): Json<CreateDay>,
) -> Result<Envelope<Day>, HandlerError> {
    principal.require_admin()?;
    let day = state.store.create_day(input).await?;
    Ok(Envelope::created(day))
}

pub async fn create_cycle<S: Store + 'static>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(input): Json<CreateCycle>,
) -> Result<Envelope<Cycle>, HandlerError> {
    principal.require_admin()?;
    let cycle = state.store.create_cycle(input).await?;
    Ok(Envelope::created(cycle))
}

/// Creates the week, then attaches it to its cycle — `CreateWeek` already
/// names the owning `cycle_id`, so the client shouldn't need a second call.
pub async fn create_week<S: Store + 'static>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(input): Json<CreateWeek>,
) -> Result<Envelope<Cycle>, HandlerError> {
    principal.require_admin()?;
    let cycle_id = input.cycle_id;
    let week = state.store.create_week(input).await?;
    let cycle = state.store.attach_week(cycle_id, week.id).await?;
    Ok(Envelope::created(cycle))
}

pub async fn create_program<S: Store + 'static>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(input): Json<CreateProgram>,
) -> Result<Envelope<Program>, HandlerError> {
    principal.require_admin()?;
    let program = state.store.create_program(input).await?;
    Ok(Envelope::created(program))
}

pub async fn create_daily_lookup<S: Store + 'static>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(input): Json<CreateDailyLookup>,
) -> Result<Envelope<DailyLookup>, HandlerError> {
    principal.require_admin()?;
    let lookup = state.store.create_daily_lookup(input).await?;
    Ok(Envelope::created(lookup))
}

pub async fn create_weekly_lookup<S: Store + 'static>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(input): Json<CreateWeeklyLookup>,
) -> Result<Envelope<WeeklyLookup>, HandlerError> {
    principal.require_admin()?;
    let lookup = state.store.create_weekly_lookup(input).await?;
    Ok(Envelope::created(lookup))
}

#[derive(serde::Serialize)]
pub struct ProgressionDefinitionResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub definition: ProgressionDefinition,
}

pub async fn create_progression<S: Store + 'static>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(input): Json<CreateProgressionDefinition>,
) -> Result<Envelope<ProgressionDefinitionResponse>, HandlerError> {
    principal.require_admin()?;
    let (id, definition) = state.store.create_progression_definition(input).await?;
    Ok(Envelope::created(ProgressionDefinitionResponse { id, definition }))
}

/// `POST /programs/{id}/progression-links` — the piece of admin CRUD the
/// minimum-surface table leaves implicit: without it a progression can
/// never actually apply to a lift in a program.
pub async fn create_progression_link<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(program_id): Path<Uuid>,
    principal: Principal,
    Json(mut input): Json<CreateProgramProgressionLink>,
) -> Result<Envelope<ProgramProgressionLink>, HandlerError> {
    principal.require_admin()?;
    input.program_id = program_id;
    let link = state.store.create_program_progression_link(input).await?;
    Ok(Envelope::created(link))
}
