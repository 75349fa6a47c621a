//! Manual/admin progression triggering (spec.md §4.6, §6).

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::envelope::Envelope;
use crate::api::error::HandlerError;
use crate::api::state::AppState;
use crate::auth::models::Principal;
use crate::kernel::error::KernelError;
use crate::kernel::ports::{Catalog, EnrollmentStore, Store};
use crate::kernel::progression::{ProgressionEngine, ProgressionOutcome, TriggerOptions};
use crate::models::ProgressionDefinition;

#[derive(Debug, Deserialize)]
pub struct TriggerRequest {
    pub progression_id: Uuid,
    pub lift_id: Uuid,
    #[serde(default)]
    pub force: bool,
    /// Required for AMRAP/Stage progressions, which read a specific
    /// session's logged sets; omitted for Linear/Cycle triggers.
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

pub async fn trigger<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(lifter_id): Path<Uuid>,
    principal: Principal,
    Json(input): Json<TriggerRequest>,
) -> Result<Envelope<ProgressionOutcome>, HandlerError> {
    principal.require_owner(lifter_id)?;

    let enrollment = state.store.get(lifter_id).await?.ok_or(KernelError::NotEnrolled)?;
    let definition = state.store.get_progression_definition(input.progression_id).await?;
    let event = trigger_event(&definition);

    let engine = ProgressionEngine::new(state.store.as_ref(), state.store.as_ref(), state.store.as_ref());
    let outcome = engine
        .trigger(
            lifter_id,
            enrollment.program_id,
            input.progression_id,
            input.lift_id,
            event,
            TriggerOptions { force: input.force, session_id: input.session_id },
            state.now(),
        )
        .await?;
    Ok(Envelope::ok(outcome))
}

fn trigger_event(definition: &ProgressionDefinition) -> crate::models::TriggerType {
    definition.trigger_type()
}
