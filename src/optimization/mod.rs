//! optimization — numeric core of the synthetic control fit.
//!
//! Purpose
//! -------
//! Provide the two nested solvers behind a weight solution and a single
//! error surface for both:
//!
//! - `simplex_qp`: the inner donor-weight QP over the probability simplex.
//! - `criterion_optimizer`: an Argmin-backed minimizer used for the outer
//!   search over predictor weights.
//! - `numerical_stability`: maps from unconstrained optimizer space onto the
//!   simplex.
//!
//! Invariants & assumptions
//! ------------------------
//! - Solvers never panic on bad input; shape, finiteness, and configuration
//!   problems are returned as `errors::OptError`.
//! - Every inner QP solve is bounded by `QPOptions::max_iter`.
//!
//! Conventions
//! -----------
//! - This layer is unaware of panels, units, or years. The `scm` layer
//!   attaches unit and predictor context when it wraps an `OptError`.
//! - No logging here, except the optional Argmin observer behind the
//!   `obs_slog` feature.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each solver; end-to-end behavior is covered by
//!   the `scm` tests and the integration suite.

pub mod criterion_optimizer;
pub mod errors;
pub mod numerical_stability;
pub mod simplex_qp;

pub mod prelude {
    pub use super::criterion_optimizer::prelude::*;
    pub use super::errors::{OptError, OptResult};
    pub use super::numerical_stability::prelude::*;
    pub use super::simplex_qp::{QPOptions, QPOutcome, solve_simplex_qp};
}
