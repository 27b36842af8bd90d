//! Execution helper that runs an `argmin` solver on a [`Criterion`] and
//! returns a crate-friendly [`OptimOutcome`].
use crate::optimization::{
    criterion_optimizer::{
        adapter::ArgMinAdapter,
        traits::{Criterion, OptimOutcome, OuterOptions},
        types::{Grad, Theta},
    },
    errors::OptResult,
};
#[cfg(feature = "obs_slog")]
use argmin::core::CostFunction;
use argmin::core::{Executor, IterState, Solver, State};

/// Gradient slot of an Argmin state: `Grad` for L-BFGS, `()` for
/// Nelder–Mead.
pub trait GradientSlot: Clone {
    fn into_grad(self) -> Option<Grad>;
}

impl GradientSlot for Grad {
    fn into_grad(self) -> Option<Grad> {
        Some(self)
    }
}

impl GradientSlot for () {
    fn into_grad(self) -> Option<Grad> {
        None
    }
}

/// Run an `argmin` solver on a criterion problem.
///
/// Wires the initial parameter `theta0`, the optional iteration cap from
/// `opts.tols.max_iter`, and (with the `obs_slog` feature and
/// `opts.verbose`) a terminal slog observer, then converts the final state
/// into an [`OptimOutcome`].
///
/// # Errors
/// - Any `argmin` runtime error, including errors raised by the criterion
///   itself, mapped through `From<argmin::core::Error>`.
/// - Validation errors from [`OptimOutcome::new`].
///
/// ```ignore
/// let problem = ArgMinAdapter::new(&criterion, &data);
/// let solver = build_optimizer_nelder_mead(&theta0, &opts)?;
/// let out = run_solver(theta0, &opts, problem, solver)?;
/// ```
pub fn run_solver<'a, F, S, G>(
    theta0: Theta, opts: &OuterOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: Criterion,
    G: GradientSlot,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, G, (), (), (), f64>>,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient().and_then(GradientSlot::into_grad);
    OptimOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

#[cfg(feature = "obs_slog")]
fn log_initial_state<F: Criterion>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()> {
    let c0 = problem.cost(theta0)?;
    eprintln!("init: criterion(theta0) = {c0:.6}");
    Ok(())
}
