//! criterion_optimizer — argmin-powered minimizer for the outer SCM problem.
//!
//! Purpose
//! -------
//! Provide a small Argmin-backed layer for **minimizing** a scalar criterion
//! `c(θ)` over an unconstrained parameter vector. The synthetic-control fit
//! uses it to search predictor weights; the layer itself knows nothing about
//! panels or donors.
//!
//! Key behaviors
//! -------------
//! - Callers implement [`Criterion`] and call [`minimize`].
//! - [`OuterMethod::NelderMead`] (default) runs derivative-free; the
//!   [`OuterMethod::Lbfgs`] variants run L-BFGS with finite-difference
//!   gradients whenever [`Criterion::grad`] is not implemented.
//! - Results are normalized into an [`OptimOutcome`].
//!
//! Invariants & assumptions
//! ------------------------
//! - [`Criterion::value`] reports invalid inputs and inner-solver failures
//!   as [`OptError`](crate::optimization::errors::OptError) values; they are
//!   carried through Argmin and recovered unchanged.
//! - Configuration types ([`Tolerances`], [`OuterOptions`]) are validated on
//!   construction.
//!
//! Conventions
//! -----------
//! - Constraints on the parameters (e.g. simplex membership) are handled by
//!   the caller through a reparameterization; see
//!   [`numerical_stability`](crate::optimization::numerical_stability).
//!
//! Testing notes
//! -------------
//! - Unit tests cover option validation, solver construction, adapter
//!   error plumbing, and end-to-end runs on a shifted quadratic bowl.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::minimize;
pub use self::traits::{
    Criterion, LineSearcher, OptimOutcome, OuterMethod, OuterOptions, Tolerances,
};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::minimize;
    pub use super::traits::{
        Criterion, LineSearcher, OptimOutcome, OuterMethod, OuterOptions, Tolerances,
    };
    pub use super::types::{Cost, Grad, Theta};
}
