//! End-to-end kernel scenarios from spec.md §8, run against `MemoryStore`
//! with no HTTP layer involved: `StateMachine`/`WorkoutProjector`/
//! `ProgressionEngine` wired together exactly as `api::state::AppState`
//! wires them, just without `axum` in the loop.

mod common;

use barbell_engine::kernel::error::KernelError;
use barbell_engine::kernel::ports::{Clock, LiftMaxStore, SessionStore};
use barbell_engine::kernel::progression::{ProgressionEngine, TriggerOptions};
use barbell_engine::kernel::projector::WorkoutProjector;
use barbell_engine::kernel::state_machine::StateMachine;
use barbell_engine::models::*;
use barbell_engine::store::memory::MemoryStore;
use chrono::Utc;
use uuid::Uuid;

fn state_machine(store: &MemoryStore, clock: &barbell_engine::store::memory::SystemClock) -> StateMachine<'_> {
    StateMachine::new(store, &store.enrollments, &store.sessions, &store.lift_maxes, clock)
}

fn projector(store: &MemoryStore) -> WorkoutProjector<'_> {
    WorkoutProjector::new(store, &store.lift_maxes, &store.sessions)
}

/// spec.md §8 scenario 1: "BTM Week 1 Monday."
#[tokio::test]
async fn btm_week1_monday() {
    let store = MemoryStore::new();
    let fixture = common::seed_btm_program(&store).await;
    let lifter = Uuid::new_v4();

    store.lift_maxes.record_max(lifter, fixture.squat_id, MaxType::TrainingMax, 315.0, Utc::now()).await.unwrap();
    store.lift_maxes.record_max(lifter, fixture.press_id, MaxType::TrainingMax, 145.0, Utc::now()).await.unwrap();

    let enrollment = common::build_enrollment(lifter, fixture.program_id, 1, "monday", 1);
    let workout = projector(&store).current_workout(&enrollment, Utc::now().date_naive()).await.unwrap();

    let squat = workout.exercises.iter().find(|e| e.lift_id == fixture.squat_id).unwrap();
    assert_eq!(squat.sets.len(), 5);
    for s in &squat.sets {
        assert_eq!(s.weight, 285.0);
        assert_eq!(s.target_reps, 5);
        assert!(!s.is_amrap);
    }

    let press = workout.exercises.iter().find(|e| e.lift_id == fixture.press_id).unwrap();
    assert_eq!(press.sets.len(), 1);
    assert_eq!(press.sets[0].weight, 100.0);
    assert_eq!(press.sets[0].target_reps, 5);
    assert!(press.sets[0].is_amrap);
}

/// spec.md §8 scenario 2: "BTM Friday Widowmaker."
#[tokio::test]
async fn btm_friday_widowmaker() {
    let store = MemoryStore::new();
    let fixture = common::seed_btm_program(&store).await;
    let lifter = Uuid::new_v4();

    store.lift_maxes.record_max(lifter, fixture.squat_id, MaxType::TrainingMax, 315.0, Utc::now()).await.unwrap();
    store.lift_maxes.record_max(lifter, fixture.press_id, MaxType::TrainingMax, 145.0, Utc::now()).await.unwrap();

    let enrollment = common::build_enrollment(lifter, fixture.program_id, 1, "friday", 1);
    let workout = projector(&store).current_workout(&enrollment, Utc::now().date_naive()).await.unwrap();

    let squat = workout.exercises.iter().find(|e| e.lift_id == fixture.squat_id).unwrap();
    assert_eq!(squat.sets.len(), 1);
    assert_eq!(squat.sets[0].weight, 140.0);
    assert_eq!(squat.sets[0].target_reps, 20);

    let press = workout.exercises.iter().find(|e| e.lift_id == fixture.press_id).unwrap();
    assert_eq!(press.sets.len(), 10);
    for s in &press.sets {
        assert_eq!(s.weight, 105.0);
        assert_eq!(s.target_reps, 5);
    }
}

/// spec.md §8 scenario 3: "BTM CycleProgression." Runs the real
/// `StateMachine` through a full 3-week cycle so the `AFTER_WEEK`
/// `CycleProgression` trigger fires exactly as it would in production.
#[tokio::test]
async fn btm_cycle_progression_after_three_week_cycle() {
    let store = MemoryStore::new();
    let fixture = common::seed_btm_program(&store).await;
    let clock = barbell_engine::store::memory::SystemClock::fixed(Utc::now());
    let sm = state_machine(&store, &clock);
    let lifter = Uuid::new_v4();

    store.lift_maxes.record_max(lifter, fixture.squat_id, MaxType::TrainingMax, 315.0, clock.now()).await.unwrap();
    store.lift_maxes.record_max(lifter, fixture.press_id, MaxType::TrainingMax, 145.0, clock.now()).await.unwrap();

    sm.enroll(lifter, fixture.program_id, clock.now()).await.unwrap();
    sm.advance_week(lifter, clock.now()).await.unwrap(); // week1 -> week2
    sm.advance_week(lifter, clock.now()).await.unwrap(); // week2 -> week3
    let enrollment = sm.advance_week(lifter, clock.now()).await.unwrap(); // week3 -> cycle complete

    assert_eq!(enrollment.enrollment_status, EnrollmentStatus::BetweenCycles);
    assert_eq!(enrollment.cycle_status, CycleStatus::Completed);

    let new_max = store
        .lift_maxes
        .current_max(lifter, fixture.squat_id, MaxType::TrainingMax)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(new_max.value, 325.0);

    sm.start_next_cycle(lifter, clock.now()).await.unwrap();
    let enrollment = common::build_enrollment(lifter, fixture.program_id, 1, "monday", 2);
    let workout = projector(&store).current_workout(&enrollment, clock.now().date_naive()).await.unwrap();
    let squat = workout.exercises.iter().find(|e| e.lift_id == fixture.squat_id).unwrap();
    // 325 * 0.9 = 292.5 -> 295.
    assert_eq!(squat.sets[0].weight, 295.0);
}

/// spec.md §8 scenario 4: "Texas Method week rollover." Squat starts at
/// TM=315; after one `AFTER_WEEK` `LinearProgression` of `+5` the Volume,
/// Recovery, and Intensity days all reflect the new TM=320.
#[tokio::test]
async fn texas_method_week_rollover() {
    let store = MemoryStore::new();
    let fixture = common::seed_texas_method_program(&store).await;
    let clock = barbell_engine::store::memory::SystemClock::fixed(Utc::now());
    let lifter = Uuid::new_v4();

    store.lift_maxes.record_max(lifter, fixture.squat_id, MaxType::TrainingMax, 315.0, clock.now()).await.unwrap();

    let week1_volume = common::build_enrollment(lifter, fixture.program_id, 1, "volume", 1);
    let workout = projector(&store).current_workout(&week1_volume, clock.now().date_naive()).await.unwrap();
    let squat = &workout.exercises.iter().find(|e| e.lift_id == fixture.squat_id).unwrap().sets;
    // 315 * 1.0 * 0.90 = 283.5 -> 285.
    assert_eq!(squat[0].weight, 285.0);

    let engine = ProgressionEngine::new(&store, &store.lift_maxes, &store.sessions);
    let outcome = engine
        .trigger(
            lifter,
            fixture.program_id,
            fixture.linear_progression_id,
            fixture.squat_id,
            TriggerType::AfterWeek,
            TriggerOptions { force: false, session_id: None },
            clock.now(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.new_value, 320.0);

    let week2_volume = common::build_enrollment(lifter, fixture.program_id, 2, "volume", 1);
    let workout = projector(&store).current_workout(&week2_volume, clock.now().date_naive()).await.unwrap();
    let squat = &workout.exercises.iter().find(|e| e.lift_id == fixture.squat_id).unwrap().sets;
    // 320 * 0.90 = 288 -> 290.
    assert_eq!(squat[0].weight, 290.0);

    let week2_recovery = common::build_enrollment(lifter, fixture.program_id, 2, "recovery", 1);
    let workout = projector(&store).current_workout(&week2_recovery, clock.now().date_naive()).await.unwrap();
    let squat = &workout.exercises.iter().find(|e| e.lift_id == fixture.squat_id).unwrap().sets;
    // 320 * 0.72 = 230.4 -> 230.
    assert_eq!(squat.len(), 2);
    assert_eq!(squat[0].weight, 230.0);

    let week2_intensity = common::build_enrollment(lifter, fixture.program_id, 2, "intensity", 1);
    let workout = projector(&store).current_workout(&week2_intensity, clock.now().date_naive()).await.unwrap();
    let squat = &workout.exercises.iter().find(|e| e.lift_id == fixture.squat_id).unwrap().sets;
    assert_eq!(squat.len(), 1);
    assert_eq!(squat[0].weight, 320.0);
}

/// spec.md §8 round-trip property: "SetMeetDate(d) then SetMeetDate(null)
/// restores off_season and daysOut = 0."
#[tokio::test]
async fn set_meet_date_then_clear_restores_off_season() {
    let store = MemoryStore::new();
    let fixture = common::seed_btm_program(&store).await;
    let clock = barbell_engine::store::memory::SystemClock::fixed(Utc::now());
    let sm = state_machine(&store, &clock);
    let lifter = Uuid::new_v4();

    sm.enroll(lifter, fixture.program_id, clock.now()).await.unwrap();

    let meet_day = clock.now().date_naive() + chrono::Duration::days(14);
    let enrollment = sm.set_meet_date(lifter, Some(meet_day), clock.now()).await.unwrap();
    let phase = barbell_engine::kernel::phase::resolve(enrollment.meet_date, clock.now().date_naive());
    assert_eq!(phase.phase, barbell_engine::kernel::phase::Phase::Peak);

    let enrollment = sm.set_meet_date(lifter, None, clock.now()).await.unwrap();
    let phase = barbell_engine::kernel::phase::resolve(enrollment.meet_date, clock.now().date_naive());
    assert_eq!(phase.phase, barbell_engine::kernel::phase::Phase::OffSeason);
    assert_eq!(phase.days_out, 0);
}

/// spec.md §8 round-trip property: "Finishing a session is idempotent
/// w.r.t. re-invocation (returns 409 on second attempt)" — at the kernel
/// level this is `SessionNotOpen`; the HTTP mapping to 409 is asserted in
/// `api_test.rs`.
#[tokio::test]
async fn finish_session_twice_is_session_not_open_on_the_second_call() {
    let store = MemoryStore::new();
    let fixture = common::seed_btm_program(&store).await;
    let clock = barbell_engine::store::memory::SystemClock::fixed(Utc::now());
    let sm = state_machine(&store, &clock);
    let lifter = Uuid::new_v4();

    sm.enroll(lifter, fixture.program_id, clock.now()).await.unwrap();
    let session = sm.start_session(lifter, clock.now()).await.unwrap();
    store
        .sessions
        .append_set(LoggedSet {
            id: Uuid::new_v4(),
            session_id: session.id,
            prescription_id: Uuid::new_v4(),
            lift_id: fixture.squat_id,
            set_number: 1,
            weight: 285.0,
            target_reps: 5,
            reps_performed: 5,
            is_amrap: false,
        })
        .await
        .unwrap();

    let first = sm.finish_session(session.id, clock.now()).await.unwrap();
    assert_eq!(first.status, SessionStatus::Completed);

    let err = sm.finish_session(session.id, clock.now()).await.unwrap_err();
    assert!(matches!(err, KernelError::SessionNotOpen));
}

/// spec.md §8 universal invariant: "enrollment.currentWeek ∈ [1,
/// cycle.lengthWeeks] whenever enrollmentStatus ∈ {ACTIVE, BETWEEN_CYCLES}."
#[tokio::test]
async fn current_week_stays_within_cycle_bounds_across_advances() {
    let store = MemoryStore::new();
    let fixture = common::seed_btm_program(&store).await;
    let clock = barbell_engine::store::memory::SystemClock::fixed(Utc::now());
    let sm = state_machine(&store, &clock);
    let lifter = Uuid::new_v4();

    sm.enroll(lifter, fixture.program_id, clock.now()).await.unwrap();
    for _ in 0..3 {
        let enrollment = sm.advance_week(lifter, clock.now()).await.unwrap();
        assert!(enrollment.current_week >= 1 && enrollment.current_week <= 3);
    }
}

/// spec.md §8 universal invariant: `WorkoutProjector` is idempotent when no
/// mutation intervenes between calls.
#[tokio::test]
async fn projector_is_idempotent_without_intervening_mutation() {
    let store = MemoryStore::new();
    let fixture = common::seed_btm_program(&store).await;
    let lifter = Uuid::new_v4();
    store.lift_maxes.record_max(lifter, fixture.squat_id, MaxType::TrainingMax, 315.0, Utc::now()).await.unwrap();
    store.lift_maxes.record_max(lifter, fixture.press_id, MaxType::TrainingMax, 145.0, Utc::now()).await.unwrap();

    let enrollment = common::build_enrollment(lifter, fixture.program_id, 1, "monday", 1);
    let proj = projector(&store);
    let first = proj.current_workout(&enrollment, Utc::now().date_naive()).await.unwrap();
    let second = proj.current_workout(&enrollment, Utc::now().date_naive()).await.unwrap();

    assert_eq!(first.exercises.len(), second.exercises.len());
    for (a, b) in first.exercises.iter().zip(second.exercises.iter()) {
        assert_eq!(a.sets, b.sets);
    }
}
