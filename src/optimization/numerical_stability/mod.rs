//! numerical_stability — simplex reparameterizations for the outer solver.
//!
//! Purpose
//! -------
//! Predictor weights `v` live on the probability simplex while the outer
//! solvers work in unconstrained space. This module holds the maps between
//! the two and the small constants guarding their degenerate cases.
//!
//! Conventions
//! -----------
//! - Nelder–Mead pairs with [`abs_normalize`]; L-BFGS pairs with
//!   [`safe_softmax`] so the criterion stays differentiable.
//! - All maps return a vector of the input length whose entries are
//!   non-negative and sum to one.
//! - Pure functions; no logging or allocation beyond the returned vector.

pub mod transformations;

pub use self::transformations::{abs_normalize, safe_softmax, safe_softmax_inv, uniform};

pub mod prelude {
    pub use super::transformations::{abs_normalize, safe_softmax, safe_softmax_inv};
}
