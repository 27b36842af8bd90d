//! criterion_optimizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types and Argmin solver aliases used by the
//! outer (predictor-weight) optimizer so the rest of the crate never spells
//! out Argmin generics.
//!
//! Invariants & assumptions
//! ------------------------
//! - All optimizer vectors are `ndarray::Array1<f64>`.
//! - `Cost` is the criterion value being **minimized**; there is no sign
//!   flip anywhere in this subtree.
//!
//! Conventions
//! -----------
//! - `DEFAULT_LBFGS_MEM` is the L-BFGS history size used when the caller
//!   does not override it.
//! - Nelder–Mead operates without gradients, so its Argmin state carries
//!   `()` in the gradient slot.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    neldermead::NelderMead,
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Unconstrained parameter vector `θ` seen by the outer solver.
pub type Theta = Array1<f64>;

/// Gradient of the criterion with respect to `θ`.
pub type Grad = Array1<f64>;

/// Scalar criterion value (minimized).
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Relative perturbation applied to non-zero coordinates when building the
/// initial Nelder–Mead simplex.
pub const NM_NONZERO_DELTA: f64 = 0.05;

/// Absolute perturbation applied to zero coordinates when building the
/// initial Nelder–Mead simplex.
pub const NM_ZERO_DELTA: f64 = 0.00025;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// Derivative-free Nelder–Mead simplex solver.
pub type NelderMeadSolver = NelderMead<Theta, Cost>;
