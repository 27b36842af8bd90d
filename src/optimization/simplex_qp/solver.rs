//! Accelerated projected gradient for the donor-weight QP.
//!
//! Problem
//! -------
//! `min_w f(w) = Σ_m v_m (x1_m − (X0 w)_m)²` subject to `w ≥ 0`, `Σw = 1`,
//! with `X0` of shape `k × J` (predictors × donors) and `v ≥ 0`.
//!
//! Method
//! ------
//! FISTA with the gradient-based adaptive restart of O'Donoghue & Candès.
//! The step is `1/L` with `L = 2 λ_max(X0ᵀ V X0)`, computed exactly from the
//! `k × k` matrix `V^{1/2} X0 X0ᵀ V^{1/2}` (same non-zero spectrum).
//!
//! Stopping
//! --------
//! The run stops at the first iterate `w⁺` where either
//! - the prox-gradient fixed-point residual `‖w⁺ − y‖_∞` is at most `tol`, or
//! - the Frank–Wolfe gap `∇f(w⁺)·w⁺ − min_j ∇f(w⁺)_j`, an upper bound on
//!   `f(w⁺) − f*`, is at most `tol · (1 + f(w₀))` with `w₀` the uniform start.
//!
//! The gap test is invariant to rescaling predictors, so rows of very
//! different magnitude still terminate. After `max_iter` iterations the
//! solve fails with [`OptError::QPNotConverged`].
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

use crate::optimization::{
    errors::{OptError, OptResult},
    numerical_stability::uniform,
    simplex_qp::projection::project_onto_simplex,
};

/// Curvature below which the objective is treated as constant in `w`.
const FLAT_CURVATURE: f64 = 1e-14;

/// Inner QP configuration.
///
/// Default: `max_iter = 50_000`, `tol = 1e-10`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QPOptions {
    pub max_iter: usize,
    pub tol: f64,
}

impl QPOptions {
    /// # Errors
    /// - [`OptError::InvalidQPMaxIter`] if `max_iter == 0`.
    /// - [`OptError::InvalidQPTol`] if `tol` is not finite and positive.
    pub fn new(max_iter: usize, tol: f64) -> OptResult<Self> {
        if max_iter == 0 {
            return Err(OptError::InvalidQPMaxIter { max_iter });
        }
        if !tol.is_finite() || tol <= 0.0 {
            return Err(OptError::InvalidQPTol { tol });
        }
        Ok(Self { max_iter, tol })
    }
}

impl Default for QPOptions {
    fn default() -> Self {
        Self { max_iter: 50_000, tol: 1e-10 }
    }
}

/// Result of one inner solve.
#[derive(Debug, Clone, PartialEq)]
pub struct QPOutcome {
    /// Donor weights on the simplex.
    pub w: Array1<f64>,
    /// `f(w)`.
    pub loss: f64,
    pub iterations: usize,
}

/// Solve the donor-weight QP for predictor weights `v`.
///
/// # Errors
/// - [`OptError::EmptyDonorPool`] if `x0` has no columns.
/// - [`OptError::QPDimMismatch`] / [`OptError::QPWeightDimMismatch`] for
///   inconsistent shapes.
/// - [`OptError::QPNonFiniteInput`] for NaN/∞ entries.
/// - [`OptError::QPNotConverged`] when the iteration cap is reached.
pub fn solve_simplex_qp(
    x0: &Array2<f64>, x1: &Array1<f64>, v: &Array1<f64>, opts: &QPOptions,
) -> OptResult<QPOutcome> {
    validate_inputs(x0, x1, v)?;
    let n_donors = x0.ncols();

    if n_donors == 1 {
        let w = Array1::ones(1);
        let loss = weighted_loss(x0, x1, v, &w);
        return Ok(QPOutcome { w, loss, iterations: 0 });
    }

    let lipschitz = 2.0 * max_curvature(x0, v);
    if lipschitz <= FLAT_CURVATURE {
        let w = uniform(n_donors);
        let loss = weighted_loss(x0, x1, v, &w);
        return Ok(QPOutcome { w, loss, iterations: 0 });
    }

    let mut w = uniform(n_donors);
    let mut y = w.clone();
    let mut t = 1.0_f64;
    let gap_tol = opts.tol * (1.0 + weighted_loss(x0, x1, v, &w));
    let mut residual = f64::INFINITY;
    let mut gap = f64::INFINITY;

    for iter in 1..=opts.max_iter {
        let grad = gradient(x0, x1, v, &y);
        let w_next = project_onto_simplex((&y - &(grad / lipschitz)).view());

        residual = max_abs_diff(&w_next, &y);
        gap = frank_wolfe_gap(&gradient(x0, x1, v, &w_next), &w_next);
        if residual <= opts.tol || gap <= gap_tol {
            let loss = weighted_loss(x0, x1, v, &w_next);
            return Ok(QPOutcome { w: w_next, loss, iterations: iter });
        }

        let delta = &w_next - &w;
        if (&y - &w_next).dot(&delta) > 0.0 {
            t = 1.0;
            y = w_next.clone();
        } else {
            let t_next = 0.5 * (1.0 + (1.0 + 4.0 * t * t).sqrt());
            y = &w_next + &(delta * ((t - 1.0) / t_next));
            t = t_next;
        }
        w = w_next;
    }

    Err(OptError::QPNotConverged { iterations: opts.max_iter, step: residual, gap })
}

/// `Σ_m v_m (x1_m − (X0 w)_m)²`.
pub fn weighted_loss(x0: &Array2<f64>, x1: &Array1<f64>, v: &Array1<f64>, w: &Array1<f64>) -> f64 {
    let r = x1 - &x0.dot(w);
    r.iter().zip(v.iter()).map(|(ri, vi)| vi * ri * ri).sum()
}

fn gradient(x0: &Array2<f64>, x1: &Array1<f64>, v: &Array1<f64>, w: &Array1<f64>) -> Array1<f64> {
    let weighted_residual = (x0.dot(w) - x1) * v;
    x0.t().dot(&weighted_residual) * 2.0
}

/// `g·w − min_j g_j`; non-negative for `w` on the simplex.
fn frank_wolfe_gap(grad: &Array1<f64>, w: &Array1<f64>) -> f64 {
    let min_grad = grad.iter().copied().fold(f64::INFINITY, f64::min);
    (grad.dot(w) - min_grad).max(0.0)
}

fn max_curvature(x0: &Array2<f64>, v: &Array1<f64>) -> f64 {
    let k = x0.nrows();
    let sqrt_v = v.mapv(|vi| vi.max(0.0).sqrt());
    let gram = DMatrix::from_fn(k, k, |i, j| sqrt_v[i] * sqrt_v[j] * x0.row(i).dot(&x0.row(j)));
    gram.symmetric_eigenvalues().max().max(0.0)
}

fn max_abs_diff(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    a.iter().zip(b.iter()).fold(0.0, |acc, (x, y)| acc.max((x - y).abs()))
}

fn validate_inputs(x0: &Array2<f64>, x1: &Array1<f64>, v: &Array1<f64>) -> OptResult<()> {
    if x0.ncols() == 0 {
        return Err(OptError::EmptyDonorPool);
    }
    if x0.nrows() != x1.len() {
        return Err(OptError::QPDimMismatch { rows: x0.nrows(), target: x1.len() });
    }
    if v.len() != x1.len() {
        return Err(OptError::QPWeightDimMismatch { expected: x1.len(), found: v.len() });
    }
    if !x0.iter().all(|x| x.is_finite()) {
        return Err(OptError::QPNonFiniteInput { what: "donor predictors" });
    }
    if !x1.iter().all(|x| x.is_finite()) {
        return Err(OptError::QPNonFiniteInput { what: "treated predictors" });
    }
    if !v.iter().all(|x| x.is_finite()) {
        return Err(OptError::QPNonFiniteInput { what: "predictor weights" });
    }
    Ok(())
}
