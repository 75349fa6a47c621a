//! Catalog and per-lifter domain types shared by the kernel, stores, and API layer.

pub mod lift;
pub mod lookup;
pub mod program;
pub mod progression_def;
pub mod enrollment;
pub mod session;
pub mod progression_state;

pub use lift::*;
pub use lookup::*;
pub use program::*;
pub use progression_def::*;
pub use enrollment::*;
pub use session::*;
pub use progression_state::*;
