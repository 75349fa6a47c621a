//! ProgressionEngine (spec.md §4.6): decides whether a progression applies
//! for a given `(lifter, progression, lift)` and with what delta.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::kernel::error::{KernelError, KernelResult, ProgressionDeclineReason};
use crate::kernel::ports::{Catalog, LiftMaxStore, SessionStore};
use crate::models::*;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressionOutcome {
    pub applied: bool,
    pub delta: f64,
    pub new_value: f64,
    pub reason: String,
}

pub struct TriggerOptions {
    pub force: bool,
    /// Required for AFTER_SET/AFTER_SESSION triggers that read the
    /// triggering session's logged sets; CYCLE_PROGRESSION and manual
    /// AFTER_WEEK triggers may omit it.
    pub session_id: Option<Uuid>,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self { force: false, session_id: None }
    }
}

pub struct ProgressionEngine<'a> {
    pub catalog: &'a dyn Catalog,
    pub lift_maxes: &'a dyn LiftMaxStore,
    pub sessions: &'a dyn SessionStore,
}

impl<'a> ProgressionEngine<'a> {
    pub fn new(catalog: &'a dyn Catalog, lift_maxes: &'a dyn LiftMaxStore, sessions: &'a dyn SessionStore) -> Self {
        Self { catalog, lift_maxes, sessions }
    }

    /// `trigger(lifter, progressionId, liftId, opts) -> outcome`, gated by
    /// `triggerType` unless `opts.force` bypasses it (admin/testing, per
    /// spec.md §4.6).
    pub async fn trigger(
        &self,
        lifter_id: Uuid,
        program_id: Uuid,
        progression_id: Uuid,
        lift_id: Uuid,
        event: TriggerType,
        opts: TriggerOptions,
        now: DateTime<Utc>,
    ) -> KernelResult<ProgressionOutcome> {
        let links = self.catalog.links_for_program(program_id).await?;
        let linked = links
            .iter()
            .any(|l| l.progression_id == progression_id && l.lift_id == lift_id);
        if !linked {
            return Err(KernelError::ProgressionNotApplied { reason: ProgressionDeclineReason::NotLinked });
        }

        let definition = self.catalog.get_progression_definition(progression_id).await?;

        if !opts.force && definition.trigger_type() != event {
            return Err(KernelError::ProgressionNotApplied { reason: ProgressionDeclineReason::Gated });
        }

        match definition {
            ProgressionDefinition::LinearProgression { increment, max_type, .. } => {
                self.apply_linear(lifter_id, lift_id, max_type, increment, now).await
            }
            ProgressionDefinition::CycleProgression { increment, max_type } => {
                self.apply_linear(lifter_id, lift_id, max_type, increment, now).await
            }
            ProgressionDefinition::AmrapProgression { max_type, thresholds, .. } => {
                let session_id = opts
                    .session_id
                    .ok_or_else(|| KernelError::Validation("AMRAP progression requires a session".into()))?;
                self.apply_amrap(lifter_id, progression_id, lift_id, max_type, &thresholds, session_id, now)
                    .await
            }
            ProgressionDefinition::StageProgression {
                stages,
                current_stage,
                reset_on_exhaustion,
                deload_on_reset,
                deload_percent,
                max_type,
            } => {
                let session_id = opts
                    .session_id
                    .ok_or_else(|| KernelError::Validation("stage progression requires a session".into()))?;
                self.apply_stage(
                    lifter_id,
                    progression_id,
                    lift_id,
                    max_type,
                    &stages,
                    current_stage,
                    reset_on_exhaustion,
                    deload_on_reset,
                    deload_percent,
                    session_id,
                    now,
                )
                .await
            }
        }
    }

    async fn current_value(&self, lifter_id: Uuid, lift_id: Uuid, max_type: MaxType) -> KernelResult<f64> {
        self.lift_maxes
            .current_max(lifter_id, lift_id, max_type)
            .await?
            .map(|m| m.value)
            .ok_or(KernelError::MissingMax { lift_id })
    }

    /// 4.6.a LinearProgression / 4.6.d CycleProgression: always applied.
    async fn apply_linear(
        &self,
        lifter_id: Uuid,
        lift_id: Uuid,
        max_type: MaxType,
        increment: f64,
        now: DateTime<Utc>,
    ) -> KernelResult<ProgressionOutcome> {
        let current = self.current_value(lifter_id, lift_id, max_type).await?;
        let new_value = current + increment;
        self.lift_maxes.record_max(lifter_id, lift_id, max_type, new_value, now).await?;
        Ok(ProgressionOutcome { applied: true, delta: increment, new_value, reason: "Applied".into() })
    }

    /// 4.6.b AMRAPProgression: greatest `minReps <= r` threshold wins.
    async fn apply_amrap(
        &self,
        lifter_id: Uuid,
        progression_id: Uuid,
        lift_id: Uuid,
        max_type: MaxType,
        thresholds: &[AmrapThreshold],
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> KernelResult<ProgressionOutcome> {
        let mut state = self
            .sessions
            .get_progression_state(lifter_id, progression_id, lift_id)
            .await?
            .unwrap_or_else(|| ProgressionState::new(lifter_id, progression_id, lift_id, 0));

        if state.applied_in_sessions.contains(&session_id) {
            return Err(KernelError::ProgressionNotApplied { reason: ProgressionDeclineReason::Gated });
        }

        let sets = self.sessions.sets_for_session(session_id).await?;
        let representative = sets
            .iter()
            .filter(|s| s.lift_id == lift_id && s.is_amrap)
            .last();

        let Some(representative) = representative else {
            return Err(KernelError::ProgressionNotApplied { reason: ProgressionDeclineReason::BelowThreshold });
        };

        let r = representative.reps_performed;
        let best = thresholds
            .iter()
            .filter(|t| t.min_reps <= r)
            .max_by_key(|t| t.min_reps);

        let Some(best) = best else {
            return Ok(ProgressionOutcome {
                applied: false,
                delta: 0.0,
                new_value: self.current_value(lifter_id, lift_id, max_type).await?,
                reason: ProgressionDeclineReason::BelowThreshold.to_string(),
            });
        };

        let current = self.current_value(lifter_id, lift_id, max_type).await?;
        let new_value = current + best.increment;
        self.lift_maxes.record_max(lifter_id, lift_id, max_type, new_value, now).await?;

        state.applied_in_sessions.insert(session_id);
        state.last_applied_at = Some(now);
        self.sessions.put_progression_state(state).await?;

        Ok(ProgressionOutcome { applied: true, delta: best.increment, new_value, reason: "Applied".into() })
    }

    /// 4.6.c StageProgression: volume check against the active stage's
    /// `minVolume`, with failure-counter and stage-exhaustion semantics.
    #[allow(clippy::too_many_arguments)]
    async fn apply_stage(
        &self,
        lifter_id: Uuid,
        progression_id: Uuid,
        lift_id: Uuid,
        max_type: MaxType,
        stages: &[Stage],
        definition_initial_stage: usize,
        reset_on_exhaustion: bool,
        deload_on_reset: bool,
        deload_percent: f64,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> KernelResult<ProgressionOutcome> {
        let mut state = self
            .sessions
            .get_progression_state(lifter_id, progression_id, lift_id)
            .await?
            .unwrap_or_else(|| ProgressionState::new(lifter_id, progression_id, lift_id, definition_initial_stage));

        if state.applied_in_sessions.contains(&session_id) {
            return Err(KernelError::ProgressionNotApplied { reason: ProgressionDeclineReason::Gated });
        }

        let active_stage = stages.get(state.current_stage).ok_or_else(|| {
            KernelError::Validation("current_stage out of range for stage list".into())
        })?;

        let sets = self.sessions.sets_for_session(session_id).await?;
        let total_reps: u32 = sets.iter().filter(|s| s.lift_id == lift_id).map(|s| s.reps_performed).sum();

        let current = self.current_value(lifter_id, lift_id, max_type).await?;
        let outcome;

        if total_reps >= active_stage.min_volume {
            state.failure_count = 0;
            outcome = ProgressionOutcome { applied: true, delta: 0.0, new_value: current, reason: "Success".into() };
        } else {
            state.failure_count += 1;
            if state.current_stage + 1 < stages.len() {
                state.current_stage += 1;
                state.failure_count = 0;
                outcome = ProgressionOutcome { applied: true, delta: 0.0, new_value: current, reason: "StageAdvanced".into() };
            } else if !reset_on_exhaustion {
                state.applied_in_sessions.insert(session_id);
                self.sessions.put_progression_state(state).await?;
                return Err(KernelError::ProgressionNotApplied {
                    reason: ProgressionDeclineReason::ManualInterventionRequired,
                });
            } else {
                state.current_stage = 0;
                let delta = if deload_on_reset { -current * deload_percent / 100.0 } else { 0.0 };
                let new_value = current + delta;
                if delta != 0.0 {
                    self.lift_maxes.record_max(lifter_id, lift_id, max_type, new_value, now).await?;
                }
                outcome = ProgressionOutcome { applied: true, delta, new_value, reason: "StageReset".into() };
            }
        }

        state.applied_in_sessions.insert(session_id);
        state.last_applied_at = Some(now);
        self.sessions.put_progression_state(state).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn greyskull_thresholds() -> Vec<AmrapThreshold> {
        vec![
            AmrapThreshold { min_reps: 5, increment: 5.0 },
            AmrapThreshold { min_reps: 7, increment: 10.0 },
            AmrapThreshold { min_reps: 9, increment: 15.0 },
        ]
    }

    #[tokio::test]
    async fn amrap_progression_selects_largest_qualifying_threshold() {
        let store = MemoryStore::new();
        let lifter = Uuid::from_u128(1);
        let lift = Uuid::from_u128(2);
        let program = Uuid::from_u128(3);
        let progression = Uuid::from_u128(4);

        store.seed_link(program, progression, lift).await;
        store
            .seed_progression(
                progression,
                ProgressionDefinition::AmrapProgression {
                    max_type: MaxType::OneRm,
                    trigger_type: TriggerType::AfterSet,
                    thresholds: greyskull_thresholds(),
                },
            )
            .await;
        store
            .lift_maxes
            .record_max(lifter, lift, MaxType::OneRm, 200.0, Utc::now())
            .await
            .unwrap();

        let session = store.seed_in_progress_session(lifter).await;
        store
            .sessions
            .append_set(LoggedSet {
                id: Uuid::new_v4(),
                session_id: session.id,
                prescription_id: Uuid::from_u128(9),
                lift_id: lift,
                set_number: 1,
                weight: 200.0,
                target_reps: 5,
                reps_performed: 10,
                is_amrap: true,
            })
            .await
            .unwrap();

        let engine = ProgressionEngine::new(&store, &store.lift_maxes, &store.sessions);
        let outcome = engine
            .trigger(
                lifter,
                program,
                progression,
                lift,
                TriggerType::AfterSet,
                TriggerOptions { force: false, session_id: Some(session.id) },
                Utc::now(),
            )
            .await
            .unwrap();

        assert!(outcome.applied);
        assert_eq!(outcome.delta, 15.0);
        assert_eq!(outcome.new_value, 215.0);
    }

    #[tokio::test]
    async fn stage_progression_exhaustion_without_deload_resets_without_changing_max() {
        let store = MemoryStore::new();
        let lifter = Uuid::from_u128(1);
        let lift = Uuid::from_u128(2);
        let program = Uuid::from_u128(3);
        let progression = Uuid::from_u128(4);

        store.seed_link(program, progression, lift).await;
        let stages = vec![
            Stage { name: "3x10".into(), sets: 3, reps: 10, is_amrap: false, min_volume: 30 },
            Stage { name: "3x8".into(), sets: 3, reps: 8, is_amrap: false, min_volume: 24 },
            Stage { name: "3x6".into(), sets: 3, reps: 6, is_amrap: false, min_volume: 18 },
        ];
        store
            .seed_progression(
                progression,
                ProgressionDefinition::StageProgression {
                    stages,
                    current_stage: 1,
                    reset_on_exhaustion: true,
                    deload_on_reset: false,
                    deload_percent: 10.0,
                    max_type: MaxType::TrainingMax,
                },
            )
            .await;
        store
            .lift_maxes
            .record_max(lifter, lift, MaxType::TrainingMax, 200.0, Utc::now())
            .await
            .unwrap();

        store.seed_progression_state(ProgressionState::new(lifter, progression, lift, 2)).await;

        let session = store.seed_in_progress_session(lifter).await;
        store
            .sessions
            .append_set(LoggedSet {
                id: Uuid::new_v4(),
                session_id: session.id,
                prescription_id: Uuid::from_u128(9),
                lift_id: lift,
                set_number: 1,
                weight: 200.0,
                target_reps: 6,
                reps_performed: 16,
                is_amrap: false,
            })
            .await
            .unwrap();

        let engine = ProgressionEngine::new(&store, &store.lift_maxes, &store.sessions);
        let outcome = engine
            .trigger(
                lifter,
                program,
                progression,
                lift,
                TriggerType::AfterSession,
                TriggerOptions { force: false, session_id: Some(session.id) },
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.delta, 0.0);
        assert_eq!(outcome.new_value, 200.0);

        let state = store
            .sessions
            .get_progression_state(lifter, progression, lift)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.current_stage, 0);
    }

    #[tokio::test]
    async fn failure_counter_clears_on_both_success_and_stage_transition() {
        let store = MemoryStore::new();
        let lifter = Uuid::from_u128(1);
        let lift = Uuid::from_u128(2);
        let program = Uuid::from_u128(3);
        let progression = Uuid::from_u128(4);

        store.seed_link(program, progression, lift).await;
        let stages = vec![
            Stage { name: "a".into(), sets: 3, reps: 10, is_amrap: false, min_volume: 100 },
            Stage { name: "b".into(), sets: 3, reps: 8, is_amrap: false, min_volume: 100 },
        ];
        store
            .seed_progression(
                progression,
                ProgressionDefinition::StageProgression {
                    stages,
                    current_stage: 0,
                    reset_on_exhaustion: true,
                    deload_on_reset: false,
                    deload_percent: 10.0,
                    max_type: MaxType::TrainingMax,
                },
            )
            .await;
        store
            .lift_maxes
            .record_max(lifter, lift, MaxType::TrainingMax, 200.0, Utc::now())
            .await
            .unwrap();

        let engine = ProgressionEngine::new(&store, &store.lift_maxes, &store.sessions);

        // First failure: advances from stage 0 to stage 1, clearing the counter.
        let s1 = store.seed_in_progress_session(lifter).await;
        store
            .sessions
            .append_set(LoggedSet {
                id: Uuid::new_v4(),
                session_id: s1.id,
                prescription_id: Uuid::from_u128(9),
                lift_id: lift,
                set_number: 1,
                weight: 200.0,
                target_reps: 10,
                reps_performed: 10,
                is_amrap: false,
            })
            .await
            .unwrap();
        engine
            .trigger(lifter, program, progression, lift, TriggerType::AfterSession, TriggerOptions { force: false, session_id: Some(s1.id) }, Utc::now())
            .await
            .unwrap();

        // Second failure: on stage 1, not enough to hit min_volume=100 either.
        let s2 = store.seed_in_progress_session(lifter).await;
        store
            .sessions
            .append_set(LoggedSet {
                id: Uuid::new_v4(),
                session_id: s2.id,
                prescription_id: Uuid::from_u128(9),
                lift_id: lift,
                set_number: 1,
                weight: 200.0,
                target_reps: 8,
                reps_performed: 10,
                is_amrap: false,
            })
            .await
            .unwrap();
        engine
            .trigger(lifter, program, progression, lift, TriggerType::AfterSession, TriggerOptions { force: false, session_id: Some(s2.id) }, Utc::now())
            .await
            .unwrap();

        let state = store.sessions.get_progression_state(lifter, progression, lift).await.unwrap().unwrap();
        // Two successive failures, but the first triggered an advance that
        // cleared the counter: failure_count == 1, per spec.md §9.
        assert_eq!(state.failure_count, 1);
    }
}
