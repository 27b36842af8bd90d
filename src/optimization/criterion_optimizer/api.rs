//! High-level entry point for minimizing a user-provided [`Criterion`].
//!
//! Selects Nelder–Mead or L-BFGS from [`OuterOptions::method`], wraps the
//! criterion in an [`ArgMinAdapter`], and delegates to [`run_solver`].
use crate::optimization::{
    criterion_optimizer::{
        adapter::ArgMinAdapter,
        builders::{
            build_optimizer_hager_zhang, build_optimizer_more_thuente, build_optimizer_nelder_mead,
        },
        run::run_solver,
        traits::{Criterion, LineSearcher, OptimOutcome, OuterMethod, OuterOptions},
        types::Theta,
    },
    errors::OptResult,
};

/// Minimize `f` starting from `theta0`.
///
/// # Behavior
/// - Validates the starting point via `f.check(theta0, data)`.
/// - Builds the configured solver and runs it to termination or
///   `opts.tols.max_iter`.
///
/// # Errors
/// - Propagates errors from `f.check`, the builders, and the run (including
///   errors returned by `f.value` during the search).
///
/// # Example
/// ```ignore
/// struct Bowl;
/// impl Criterion for Bowl {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> { Ok(theta.dot(theta)) }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> { Ok(()) }
/// }
///
/// let out = minimize(&Bowl, array![0.3, -0.2], &(), &OuterOptions::default())?;
/// ```
pub fn minimize<F: Criterion>(
    f: &F, theta0: Theta, data: &F::Data, opts: &OuterOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.method {
        OuterMethod::NelderMead => {
            let solver = build_optimizer_nelder_mead(&theta0, opts)?;
            run_solver(theta0, opts, problem, solver)
        }
        OuterMethod::Lbfgs(LineSearcher::MoreThuente) => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_solver(theta0, opts, problem, solver)
        }
        OuterMethod::Lbfgs(LineSearcher::HagerZhang) => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_solver(theta0, opts, problem, solver)
        }
    }
}
