use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::jwt::JwtService;
use crate::config::{AppConfig, AuthMode};
use crate::kernel::ports::{Clock, Store};
use crate::store::memory::SystemClock;
use crate::store::postgres::PostgresStore;

/// Shared application state, cloned into every handler via `State<AppState<S>>`.
/// Generic over the backing store so the HTTP layer can run against either
/// `PostgresStore` (production, via `AppState::new`) or `MemoryStore`
/// (integration tests, via `AppState::with_store`) without the handlers
/// caring which — see `kernel::ports::Store`.
#[derive(Clone)]
pub struct AppState<S: Store> {
    pub store: Arc<S>,
    pub jwt: Arc<JwtService>,
    pub auth_mode: AuthMode,
    pub clock: Arc<SystemClock>,
}

impl AppState<PostgresStore> {
    pub fn new(pool: PgPool, config: &AppConfig, clock: Arc<SystemClock>) -> Self {
        Self {
            store: Arc::new(PostgresStore::new(pool)),
            jwt: Arc::new(JwtService::new(&config.jwt_secret)),
            auth_mode: config.auth_mode,
            clock,
        }
    }
}

impl<S: Store> AppState<S> {
    /// Test/dev constructor: wire up any store, e.g. `Arc::new(MemoryStore::new())`.
    pub fn with_store(store: Arc<S>, jwt_secret: &str, auth_mode: AuthMode, clock: Arc<SystemClock>) -> Self {
        Self { store, jwt: Arc::new(JwtService::new(jwt_secret)), auth_mode, clock }
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }
}
