//! Maps from unconstrained optimizer space onto the probability simplex.
//!
//! # Provided items
//! - [`abs_normalize`]: `v = |θ| / Σ|θ|`, used with Nelder–Mead. Falls back to
//!   uniform weights when `Σ|θ|` is numerically zero.
//! - [`safe_softmax`]: max-shifted `exp(θ) / Σ exp(θ)`, used with L-BFGS.
//! - [`safe_softmax_inv`]: logits reproducing a given simplex point, with a
//!   floor on zero entries.
use ndarray::Array1;

/// Smallest weight mapped through [`safe_softmax_inv`]; zero entries would
/// otherwise produce `-∞` logits.
pub const WEIGHT_FLOOR: f64 = 1e-10;

/// Sums of absolute values below this are treated as the zero vector.
pub const DEGENERATE_SUM: f64 = 1e-300;

/// `|θ| / Σ|θ|`, or uniform weights when every entry is (numerically) zero.
pub fn abs_normalize(theta: &Array1<f64>) -> Array1<f64> {
    let abs = theta.mapv(f64::abs);
    let total = abs.sum();
    if !total.is_finite() || total <= DEGENERATE_SUM {
        return uniform(theta.len());
    }
    abs / total
}

/// Max-shifted softmax; never overflows for finite input.
pub fn safe_softmax(theta: &Array1<f64>) -> Array1<f64> {
    let max = theta.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return uniform(theta.len());
    }
    let exps = theta.mapv(|t| (t - max).exp());
    let total = exps.sum();
    exps / total
}

/// Logits `ln(max(v, WEIGHT_FLOOR))` whose softmax is `v` up to the floor.
pub fn safe_softmax_inv(v: &Array1<f64>) -> Array1<f64> {
    v.mapv(|x| x.max(WEIGHT_FLOOR).ln())
}

pub fn uniform(n: usize) -> Array1<f64> {
    Array1::from_elem(n, 1.0 / n as f64)
}
