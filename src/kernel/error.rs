use serde::Serialize;
use thiserror::Error;

/// The structured reason `ProgressionEngine::trigger` reports when it
/// declines to apply, per spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ProgressionDeclineReason {
    BelowThreshold,
    ManualInterventionRequired,
    NotLinked,
    Gated,
}

impl std::fmt::Display for ProgressionDeclineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The kernel's error taxonomy, mirroring spec.md §7 one variant per failure
/// mode. HTTP status mapping lives at the API boundary only (`api::error`);
/// the kernel itself never touches `axum` types.
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid enrollment state: {0}")]
    InvalidEnrollmentState(String),
    #[error("session already open")]
    SessionAlreadyOpen,
    #[error("session not open")]
    SessionNotOpen,
    #[error("missing max for lift {lift_id}")]
    MissingMax { lift_id: uuid::Uuid },
    #[error("logged set does not belong to the projected workout")]
    PrescriptionMismatch,
    #[error("duplicate set number for this prescription")]
    DuplicateSet,
    #[error("isAmrap flag does not match the set scheme")]
    AmrapFlagMismatch,
    #[error("progression not applied: {reason}")]
    ProgressionNotApplied { reason: ProgressionDeclineReason },
    #[error("lifter already enrolled")]
    AlreadyEnrolled,
    #[error("lifter not enrolled")]
    NotEnrolled,
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl KernelError {
    /// Stable machine-readable code, the `error.code` field of spec.md §6's
    /// envelope.
    pub fn code(&self) -> &'static str {
        match self {
            KernelError::NotFound(_) => "not_found",
            KernelError::Validation(_) => "validation",
            KernelError::InvalidEnrollmentState(_) => "invalid_enrollment_state",
            KernelError::SessionAlreadyOpen => "session_already_open",
            KernelError::SessionNotOpen => "session_not_open",
            KernelError::MissingMax { .. } => "missing_max",
            KernelError::PrescriptionMismatch => "prescription_mismatch",
            KernelError::DuplicateSet => "duplicate_set",
            KernelError::AmrapFlagMismatch => "amrap_flag_mismatch",
            KernelError::ProgressionNotApplied { .. } => "progression_not_applied",
            KernelError::AlreadyEnrolled => "already_enrolled",
            KernelError::NotEnrolled => "not_enrolled",
            KernelError::Store(_) => "internal",
        }
    }
}

pub type KernelResult<T> = Result<T, KernelError>;
