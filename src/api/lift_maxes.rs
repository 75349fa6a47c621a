use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::envelope::Envelope;
use crate::api::error::HandlerError;
use crate::api::state::AppState;
use crate::auth::models::Principal;
use crate::kernel::ports::{LiftMaxStore, Store};
use crate::models::{LiftMax, MaxType};

#[derive(Debug, Deserialize)]
pub struct SetLiftMaxRequest {
    pub lift_id: Uuid,
    pub max_type: MaxType,
    pub value: f64,
}

/// `POST /users/{id}/lift-maxes`. Not on spec.md §9's owner-only list, so
/// an admin may set a lifter's max on their behalf.
pub async fn set_lift_max<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(lifter_id): Path<Uuid>,
    principal: Principal,
    Json(input): Json<SetLiftMaxRequest>,
) -> Result<Envelope<LiftMax>, HandlerError> {
    principal.require_owner_or_admin(lifter_id)?;
    if input.value < 0.0 {
        return Err(HandlerError::Validation("value must be non-negative".into()));
    }
    let max = state
        .store
        .record_max(lifter_id, input.lift_id, input.max_type, input.value, state.now())
        .await?;
    Ok(Envelope::created(max))
}
