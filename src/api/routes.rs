use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::state::AppState;
use crate::api::{catalog, dashboard, enrollment, health, lift_maxes, programs, progressions, sets, workouts};
use crate::kernel::ports::Store;

/// Mirrors the teacher crate's `create_routes`: one function building the
/// whole `Router`, wired with the same CORS/tracing layer stack as
/// `auth::middleware::create_middleware_stack` (SPEC_FULL.md §6). Generic
/// over the store so it can be handed either a `PostgresStore`-backed
/// `AppState` (production) or a `MemoryStore`-backed one (tests).
pub fn create_routes<S: Store + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Admin template CRUD.
        .route("/lifts", post(catalog::create_lift::<S>))
        .route("/prescriptions", post(catalog::create_prescription::<S>))
        .route("/days", post(catalog::create_day::<S>))
        .route("/weeks", post(catalog::create_week::<S>))
        .route("/cycles", post(catalog::create_cycle::<S>))
        .route("/programs", post(catalog::create_program::<S>).get(programs::list_programs::<S>))
        .route("/programs/:id", get(programs::get_program_detail::<S>))
        .route("/programs/:id/progression-links", post(catalog::create_progression_link::<S>))
        .route("/weekly-lookups", post(catalog::create_weekly_lookup::<S>))
        .route("/daily-lookups", post(catalog::create_daily_lookup::<S>))
        .route("/progressions", post(catalog::create_progression::<S>))
        // Per-lifter state.
        .route("/users/:id/lift-maxes", post(lift_maxes::set_lift_max::<S>))
        .route(
            "/users/:id/program",
            post(enrollment::enroll::<S>).delete(enrollment::unenroll::<S>).get(enrollment::get_enrollment::<S>),
        )
        .route("/users/:id/workout", get(workouts::current_workout::<S>))
        .route("/users/:id/dashboard", get(dashboard::get_dashboard::<S>))
        .route("/users/:id/enrollment/advance-day", post(enrollment::advance_day::<S>))
        .route("/users/:id/enrollment/advance-week", post(enrollment::advance_week::<S>))
        .route("/users/:id/enrollment/next-cycle", post(enrollment::start_next_cycle::<S>))
        .route("/users/:id/progressions/trigger", post(progressions::trigger::<S>))
        .route("/users/:id/programs/:pid/state/meet-date", put(enrollment::set_meet_date::<S>))
        // Sessions.
        .route("/workouts/start", post(workouts::start_session::<S>))
        .route("/workouts/:id", get(workouts::get_session::<S>))
        .route("/workouts/:id/finish", post(workouts::finish_session::<S>))
        .route("/workouts/:id/abandon", post(workouts::abandon_session::<S>))
        .route("/sessions/:id/sets", post(sets::log_sets::<S>).get(sets::list_sets::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
