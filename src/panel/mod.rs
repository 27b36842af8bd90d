//! panel — immutable panel data, study timeline, and study design.
//!
//! Purpose
//! -------
//! Hold the shared, read-only inputs of a synthetic-control study: the
//! long-format observation table, the three year windows plus treatment
//! year, and the assignment of units to the treated/donor roles.
//!
//! Key behaviors
//! -------------
//! - [`PanelData`] validates observations once at construction and answers
//!   point lookups and completeness checks.
//! - [`StudyWindows`] enforces `optimize_window ⊆ plot_window` and a
//!   non-empty pre/post split around the treatment year.
//! - [`StudyDesign`] validates donor pools and derives placebo designs.
//!
//! Invariants & assumptions
//! ------------------------
//! - A panel is never mutated after construction; estimation code shares it
//!   by reference across threads.
//! - Missing observations are surfaced as [`PanelError::MissingData`] by
//!   whoever needs them; nothing in this subtree imputes or drops data.
//!
//! Downstream usage
//! ----------------
//! - The `scm` layer builds matching matrices from these types and wraps
//!   [`PanelError`] into its own error surface.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its validation rules.

pub mod data;
pub mod design;
pub mod errors;
pub mod window;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::data::{Observation, PanelData, Unit, UnitId, Year};
pub use self::design::{StudyDesign, UnitRole, validate_predictors};
pub use self::errors::{PanelError, PanelResult};
pub use self::window::{StudyWindows, YearWindow};
