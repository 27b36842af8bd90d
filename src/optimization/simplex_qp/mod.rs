//! simplex_qp — inner donor-weight problem of the synthetic control fit.
//!
//! Purpose
//! -------
//! Solve `min_w (x1 − X0 w)ᵀ diag(v) (x1 − X0 w)` over the probability
//! simplex for a fixed predictor-weight vector `v`. This is evaluated once
//! per outer criterion call, so it is allocation-light and always bounded
//! by an iteration cap.
//!
//! Key behaviors
//! -------------
//! - [`solve_simplex_qp`] runs restarted FISTA with an exact Lipschitz step.
//! - A single donor short-circuits to `w = [1]`.
//! - An empty donor pool is reported as infeasible
//!   ([`OptError::EmptyDonorPool`](crate::optimization::errors::OptError)).
//!
//! Invariants & assumptions
//! ------------------------
//! - Returned weights are non-negative and sum to one up to rounding.
//! - The solver is deterministic: same inputs give bit-identical output.

pub mod projection;
pub mod solver;

pub use self::projection::project_onto_simplex;
pub use self::solver::{QPOptions, QPOutcome, solve_simplex_qp, weighted_loss};
