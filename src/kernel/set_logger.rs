//! SetLogger (spec.md §4.5): validates and persists logged sets for the
//! active session. The sole writer of `LoggedSet` rows.

use uuid::Uuid;

use crate::kernel::error::{KernelError, KernelResult};
use crate::kernel::projector::Workout;
use crate::kernel::ports::SessionStore;
use crate::models::*;

pub struct SetLogger<'a> {
    pub sessions: &'a dyn SessionStore,
}

impl<'a> SetLogger<'a> {
    pub fn new(sessions: &'a dyn SessionStore) -> Self {
        Self { sessions }
    }

    /// `logSets(session, inputs) -> persisted sets`.
    pub async fn log_sets(
        &self,
        session: &WorkoutSession,
        workout: &Workout,
        inputs: Vec<LogSetInput>,
    ) -> KernelResult<Vec<LoggedSet>> {
        if session.status != SessionStatus::InProgress {
            return Err(KernelError::SessionNotOpen);
        }

        let existing = self.sessions.sets_for_session(session.id).await?;
        let mut seen: std::collections::HashSet<(Uuid, u32)> =
            existing.iter().map(|s| (s.prescription_id, s.set_number)).collect();

        let mut persisted = Vec::with_capacity(inputs.len());
        for input in inputs {
            if input.reps_performed > i32::MAX as u32 || input.weight < 0.0 {
                return Err(KernelError::Validation("repsPerformed/weight must be non-negative".into()));
            }

            let exercise = workout
                .exercises
                .iter()
                .find(|e| e.prescription_id == input.prescription_id && e.lift_id == input.lift_id)
                .ok_or(KernelError::PrescriptionMismatch)?;

            if !seen.insert((input.prescription_id, input.set_number)) {
                return Err(KernelError::DuplicateSet);
            }

            let prescribed = exercise
                .sets
                .iter()
                .find(|s| s.set_number == input.set_number)
                .ok_or(KernelError::PrescriptionMismatch)?;

            if prescribed.is_amrap != input.is_amrap {
                return Err(KernelError::AmrapFlagMismatch);
            }

            let set = LoggedSet {
                id: Uuid::new_v4(),
                session_id: session.id,
                prescription_id: input.prescription_id,
                lift_id: input.lift_id,
                set_number: input.set_number,
                weight: input.weight,
                target_reps: input.target_reps,
                reps_performed: input.reps_performed,
                is_amrap: input.is_amrap,
            };
            let saved = self.sessions.append_set(set).await?;
            persisted.push(saved);
        }

        Ok(persisted)
    }
}
