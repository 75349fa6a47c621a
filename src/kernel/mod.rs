//! The pure workout-generation and state-progression kernel (spec.md §1-4).
//! Depends only on the store/clock traits in [`ports`] — never on `sqlx` or
//! `axum` — so it is exercised in tests without a database or HTTP stack.

pub mod error;
pub mod evaluator;
pub mod phase;
pub mod ports;
pub mod progression;
pub mod projector;
pub mod rounder;
pub mod set_logger;
pub mod state_machine;

pub use error::{KernelError, KernelResult};
