//! scm — synthetic-control estimation, search, and inference.
//!
//! Purpose
//! -------
//! Estimate the counterfactual outcome path of a treated unit as a convex
//! combination of donor units, select predictors by randomized search, and
//! judge the estimated effect against in-space placebos.
//!
//! Key behaviors
//! -------------
//! - [`fit`] solves the bilevel predictor/donor weight problem for one
//!   predictor set.
//! - [`search`] draws random predictor subsets (seeded RNG, parallel fits)
//!   and keeps the one with the lowest optimize-window RMSE.
//! - [`evaluate`] turns donor weights into actual/synthetic/effect series.
//! - [`run_placebo`] refits every unit as if treated and ranks
//!   `Post_MSPE / Pre_MSPE` ratios into a p-value.
//! - [`SyntheticControlStudy`] chains all of the above into a
//!   [`StudyReport`] flagged complete or incomplete.
//!
//! Invariants & assumptions
//! ------------------------
//! - Donor and predictor weights are non-negative and sum to one.
//! - Required observations are checked before any fit; absent data is an
//!   error, never dropped.
//! - Given the same inputs and seed, every result is reproducible
//!   regardless of thread scheduling.
//!
//! Conventions
//! -----------
//! - Years are ascending; series are indexed like their window.
//! - Errors carry the unit, predictor subset, or trial index they concern
//!   (see [`SCMError`]).
//!
//! Downstream usage
//! ----------------
//! - Native callers use [`SyntheticControlStudy`] or the individual stages.
//! - The Python bindings in the crate root wrap the study pipeline.
//!
//! Testing notes
//! -------------
//! - Unit tests use two synthetic panels: one where the treated unit
//!   duplicates a donor exactly, and one with no exact match.
//! - End-to-end behavior is covered in `tests/integration_scm_pipeline.rs`.

pub mod errors;
pub mod evaluate;
pub mod fit;
pub mod matching;
pub mod options;
pub mod placebo;
pub mod search;
pub mod study;
pub mod summary;

#[cfg(test)]
mod fixtures;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{SCMError, SCMResult};
pub use self::evaluate::{EffectSeries, evaluate};
pub use self::fit::{FitOutcome, WeightSolution, fit, fit_matching};
pub use self::matching::MatchingData;
pub use self::options::{
    DegenerateFitPolicy, InitialV, PlaceboOptions, SCMOptions, SearchOptions,
};
pub use self::placebo::{
    DEGENERATE_MSPE, ExcludedUnit, ExclusionReason, PlaceboEntry, PlaceboOutcome, run_placebo,
};
pub use self::search::{SearchOutcome, SearchTrial, draw_subsets, search, search_seeded};
pub use self::study::{Completeness, StudyReport, SyntheticControlStudy};
pub use self::summary::{AttSummary, BalanceRow, balance_table};

pub mod prelude {
    pub use super::errors::{SCMError, SCMResult};
    pub use super::options::{
        DegenerateFitPolicy, InitialV, PlaceboOptions, SCMOptions, SearchOptions,
    };
    pub use super::study::{Completeness, StudyReport, SyntheticControlStudy};
}
