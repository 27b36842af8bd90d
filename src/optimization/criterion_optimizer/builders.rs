//! criterion_optimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Build configured Argmin solvers from [`OuterOptions`] without exposing
//! Argmin generics to higher layers.
//!
//! Key behaviors
//! -------------
//! - L-BFGS with Hager–Zhang or More–Thuente line search, with optional
//!   gradient and cost-change tolerances applied by [`configure_lbfgs`].
//! - Nelder–Mead with an axis-aligned initial simplex around `theta0`
//!   ([`initial_simplex`]) and `tol_cost` as its standard-deviation
//!   tolerance.
//!
//! Conventions
//! -----------
//! - Builders never set `max_iters`; the runner applies it.
//! - Invalid tolerances rejected by Argmin surface as [`OptError`] through
//!   `From<argmin::core::Error>`.
//!
//! [`OptError`]: crate::optimization::errors::OptError
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    criterion_optimizer::{
        traits::OuterOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, NM_NONZERO_DELTA, NM_ZERO_DELTA, NelderMeadSolver, Theta,
        },
    },
    errors::OptResult,
};

/// Construct L-BFGS with the Hager–Zhang line search.
///
/// ```ignore
/// let solver = build_optimizer_hager_zhang(&opts)?;
/// let outcome = run_solver(theta0, &opts, problem, solver)?;
/// ```
pub fn build_optimizer_hager_zhang(opts: &OuterOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(HagerZhangLS::new(), mem);
    configure_lbfgs(lbfgs, opts)
}

/// Construct L-BFGS with the More–Thuente line search.
pub fn build_optimizer_more_thuente(opts: &OuterOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(MoreThuenteLS::new(), mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply optional gradient/cost tolerances to an L-BFGS solver. `None`
/// leaves Argmin's defaults in place.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &OuterOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// Construct Nelder–Mead with its initial simplex built around `theta0`.
pub fn build_optimizer_nelder_mead(
    theta0: &Theta, opts: &OuterOptions,
) -> OptResult<NelderMeadSolver> {
    let mut solver = NelderMeadSolver::new(initial_simplex(theta0));
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_sd_tolerance(c)?;
    }
    Ok(solver)
}

/// `n + 1` vertices: `theta0` itself and, for each coordinate `i`, a copy
/// with `theta0[i]` scaled by `1 + NM_NONZERO_DELTA` (or set to
/// `NM_ZERO_DELTA` when it is exactly zero).
pub fn initial_simplex(theta0: &Theta) -> Vec<Theta> {
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for i in 0..theta0.len() {
        let mut vertex = theta0.clone();
        vertex[i] = if vertex[i] != 0.0 {
            (1.0 + NM_NONZERO_DELTA) * vertex[i]
        } else {
            NM_ZERO_DELTA
        };
        vertices.push(vertex);
    }
    vertices
}
