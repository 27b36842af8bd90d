//! Euclidean projection onto the probability simplex.
//!
//! Sort-based algorithm of Duchi, Shalev-Shwartz, Singer & Chandra (2008):
//! with `u` sorted descending, `ρ = max{ j : u_j − (Σ_{i≤j} u_i − 1)/j > 0 }`
//! and `τ = (Σ_{i≤ρ} u_i − 1)/ρ`, the projection is `max(y − τ, 0)`.
use ndarray::{Array1, ArrayView1};

/// Project `y` onto `{ w : w ≥ 0, Σw = 1 }`.
///
/// `y` must be non-empty and finite; the QP solver validates both before
/// iterating.
pub fn project_onto_simplex(y: ArrayView1<'_, f64>) -> Array1<f64> {
    let mut sorted: Vec<f64> = y.to_vec();
    sorted.sort_unstable_by(|a, b| b.total_cmp(a));

    let mut cumsum = 0.0;
    let mut tau = 0.0;
    for (j, &u) in sorted.iter().enumerate() {
        cumsum += u;
        let candidate = (cumsum - 1.0) / (j + 1) as f64;
        if u - candidate > 0.0 {
            tau = candidate;
        }
    }
    y.mapv(|x| (x - tau).max(0.0))
}
