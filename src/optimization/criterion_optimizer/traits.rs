//! Public API surface for criterion minimization.
//!
//! - [`Criterion`]: trait callers implement for the quantity to minimize.
//! - [`OuterOptions`] and [`Tolerances`]: configuration for the solver.
//! - [`OuterMethod`] / [`LineSearcher`]: choice of solver and, for L-BFGS,
//!   of line search.
//! - [`OptimOutcome`]: normalized result returned by [`minimize`].
//!
//! Convention: the criterion is minimized as-is. If an analytic gradient is
//! provided it must be the gradient of that same criterion.
//!
//! [`minimize`]: crate::optimization::criterion_optimizer::minimize
use crate::optimization::{
    criterion_optimizer::{
        types::{Cost, FnEvalMap, Grad, Theta},
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
    errors::{OptError, OptResult},
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// User-implemented criterion interface.
///
/// - `type Data`: payload carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate the criterion.
/// - `check(&Theta, &Data) -> OptResult<()>`: reject an invalid starting
///   point before the solver runs.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient. When not
///   implemented, gradient-based methods fall back to finite differences.
pub trait Criterion {
    type Data;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing is case-insensitive (`"MoreThuente"`, `"HagerZhang"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidMethod {
                name: s.to_string(),
                reason: "Valid line searches are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Solver used for the outer minimization.
///
/// Variants
/// --------
/// - `NelderMead`: derivative-free simplex search (default).
/// - `Lbfgs(LineSearcher)`: quasi-Newton with finite-difference gradients
///   unless the criterion supplies an analytic one.
///
/// Parsing
/// -------
/// Case-insensitive: `"NelderMead"` / `"Nelder-Mead"`, `"LBFGS"` (More–Thuente),
/// `"LBFGS-HagerZhang"`, `"LBFGS-MoreThuente"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OuterMethod {
    #[default]
    NelderMead,
    Lbfgs(LineSearcher),
}

impl FromStr for OuterMethod {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        match lowered.as_str() {
            "neldermead" | "nelder-mead" => Ok(OuterMethod::NelderMead),
            "lbfgs" => Ok(OuterMethod::Lbfgs(LineSearcher::MoreThuente)),
            _ => match lowered.strip_prefix("lbfgs-") {
                Some(ls) => ls.parse().map(OuterMethod::Lbfgs).map_err(|_| OptError::InvalidMethod {
                    name: s.to_string(),
                    reason: "Unknown L-BFGS line search; use 'LBFGS-HagerZhang' or 'LBFGS-MoreThuente'.",
                }),
                None => Err(OptError::InvalidMethod {
                    name: s.to_string(),
                    reason: "Valid methods are 'NelderMead', 'LBFGS', 'LBFGS-HagerZhang', 'LBFGS-MoreThuente'.",
                }),
            },
        }
    }
}

/// Outer-solver configuration.
///
/// Fields:
/// - `tols: Tolerances`: stopping rules. For Nelder–Mead, `tol_cost` is the
///   standard-deviation tolerance of the simplex vertex costs and `tol_grad`
///   is ignored.
/// - `method: OuterMethod`: solver choice.
/// - `verbose: bool`: attach a terminal observer (behind the `obs_slog`
///   feature).
/// - `lbfgs_mem: Option<usize>`: L-BFGS history; `None` uses
///   [`DEFAULT_LBFGS_MEM`](super::types::DEFAULT_LBFGS_MEM).
///
/// Default:
/// - `tol_grad = 1e-8`, `tol_cost = 1e-10`, `max_iter = 500`
/// - `method = NelderMead`, `verbose = false`, `lbfgs_mem = None`
#[derive(Debug, Clone, PartialEq)]
pub struct OuterOptions {
    pub tols: Tolerances,
    pub method: OuterMethod,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl OuterOptions {
    pub fn new(
        tols: Tolerances, method: OuterMethod, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, method, verbose, lbfgs_mem })
    }
}

impl Default for OuterOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-8), tol_cost: Some(1e-10), max_iter: Some(500) },
            method: OuterMethod::NelderMead,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Numerical tolerances and iteration limits used by the outer solver.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by `minimize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best criterion value.
/// - `converged`: `true` if the solver terminated for a reason other than
///   `NotTerminated`. Hitting `max_iter` counts as terminated; callers that
///   need a strict convergence flag inspect `status`.
/// - `status`: termination status string.
/// - `iterations`, `fn_evals`: Argmin counters.
/// - `grad_norm`: norm of the last gradient, for gradient-based methods.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm,
        })
    }

    /// Outcome for problems with a single admissible point, where no solver
    /// needs to run.
    pub fn trivial(theta_hat: Theta, value: f64) -> OptResult<Self> {
        validate_value(value)?;
        Ok(Self {
            theta_hat,
            value,
            converged: true,
            status: "Trivial".to_string(),
            iterations: 0,
            fn_evals: FnEvalMap::new(),
            grad_norm: None,
        })
    }
}
