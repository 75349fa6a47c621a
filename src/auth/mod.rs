//! Bearer-JWT and trust-header authentication (SPEC_FULL.md "Authentication").
//! `AppConfig.auth_mode` picks which one `Principal` extraction uses; the
//! kernel never sees either — it only ever receives a `lifter_id: Uuid`.

pub mod errors;
pub mod jwt;
pub mod models;
