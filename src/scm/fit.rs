//! scm::fit — bilevel predictor/donor weight optimization.
//!
//! Purpose
//! -------
//! Solve for predictor weights `v` and donor weights `w`:
//!
//! - inner: `w*(v) = argmin_{w ∈ Δ} (x1 − X0 w)ᵀ diag(v) (x1 − X0 w)`
//!   (see [`simplex_qp`](crate::optimization::simplex_qp));
//! - outer: `v* = argmin_{v ∈ Δ} MSE_optimize(w*(v))`, searched in
//!   unconstrained space by the configured outer method.
//!
//! Key behaviors
//! -------------
//! - Nelder–Mead maps `θ ↦ |θ| / Σ|θ|`; L-BFGS maps `θ ↦ softmax(θ)`.
//! - A single predictor or a single donor needs no outer search.
//! - `InitialV::Best` runs from the equal and the regression starts and
//!   keeps the lower criterion (equal wins ties).
//! - Every solver failure is returned as `SCMError::Optimization` naming
//!   the treated unit and the predictor set.
//!
//! Invariants & assumptions
//! ------------------------
//! - Reported `v` and `w` are non-negative and sum to one within 1e-9.
//! - `pre_rmse = √loss_w` where `loss_w` is the optimize-window MSE at the
//!   reported `w`.
use log::debug;
use ndarray::Array1;

use crate::optimization::{
    criterion_optimizer::{Criterion, OptimOutcome, OuterMethod, Theta, minimize},
    errors::{OptError, OptResult},
    numerical_stability::{abs_normalize, safe_softmax, safe_softmax_inv, uniform},
    simplex_qp::{QPOptions, solve_simplex_qp, weighted_loss},
};
use crate::panel::{PanelData, StudyDesign, UnitId, YearWindow};
use crate::scm::{
    errors::{SCMError, SCMResult},
    matching::MatchingData,
    options::{InitialV, SCMOptions},
    summary::{BalanceRow, balance_table},
};

/// Tolerance used when validating externally supplied weight vectors.
pub const SIMPLEX_TOL: f64 = 1e-6;

/// Donor and predictor weights of one fit.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSolution {
    donors: Vec<UnitId>,
    w: Array1<f64>,
    predictors: Vec<String>,
    v: Array1<f64>,
}

impl WeightSolution {
    /// Bundle weights with the units and predictors they refer to.
    ///
    /// Errors
    /// ------
    /// - `SCMError::InvalidSolution` on length mismatches or when `w` / `v`
    ///   leave their simplex by more than [`SIMPLEX_TOL`].
    pub fn new(
        donors: Vec<UnitId>, w: Array1<f64>, predictors: Vec<String>, v: Array1<f64>,
    ) -> SCMResult<Self> {
        if donors.len() != w.len() {
            return Err(SCMError::InvalidSolution {
                reason: format!("{} donors but {} donor weights", donors.len(), w.len()),
            });
        }
        if predictors.len() != v.len() {
            return Err(SCMError::InvalidSolution {
                reason: format!("{} predictors but {} predictor weights", predictors.len(), v.len()),
            });
        }
        check_simplex("w", &w)?;
        check_simplex("v", &v)?;
        Ok(Self { donors, w, predictors, v })
    }

    pub fn donors(&self) -> &[UnitId] {
        &self.donors
    }

    pub fn w(&self) -> &Array1<f64> {
        &self.w
    }

    pub fn predictors(&self) -> &[String] {
        &self.predictors
    }

    pub fn v(&self) -> &Array1<f64> {
        &self.v
    }

    pub fn donor_weight(&self, unit: UnitId) -> Option<f64> {
        self.donors.iter().position(|&d| d == unit).map(|i| self.w[i])
    }

    pub fn predictor_weight(&self, name: &str) -> Option<f64> {
        self.predictors.iter().position(|p| p == name).map(|i| self.v[i])
    }
}

fn check_simplex(label: &str, x: &Array1<f64>) -> SCMResult<()> {
    let sum = x.sum();
    if x.iter().any(|&xi| !xi.is_finite() || xi < -SIMPLEX_TOL) || (sum - 1.0).abs() > SIMPLEX_TOL {
        return Err(SCMError::InvalidSolution {
            reason: format!("{label} is not on the probability simplex (sum = {sum})"),
        });
    }
    Ok(())
}

/// Result of one weight fit.
///
/// - `loss_w`: optimize-window outcome MSE at `w`; `pre_rmse = √loss_w`.
/// - `loss_v`: predictor-space loss `(x1 − X0 w)ᵀ diag(v) (x1 − X0 w)` on
///   the (possibly standardized) predictors.
/// - `balance`: unscaled predictor balance of the treated unit vs. its
///   synthetic counterpart.
/// - `outer`: diagnostics of the winning outer run.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub treated: UnitId,
    pub solution: WeightSolution,
    pub loss_w: f64,
    pub pre_rmse: f64,
    pub loss_v: f64,
    pub balance: Vec<BalanceRow>,
    pub outer: OptimOutcome,
}

/// How the outer parameter vector maps onto predictor weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VMap {
    AbsNormalize,
    Softmax,
}

impl VMap {
    fn for_method(method: OuterMethod) -> Self {
        match method {
            OuterMethod::NelderMead => VMap::AbsNormalize,
            OuterMethod::Lbfgs(_) => VMap::Softmax,
        }
    }

    fn to_v(self, theta: &Theta) -> Array1<f64> {
        match self {
            VMap::AbsNormalize => abs_normalize(theta),
            VMap::Softmax => safe_softmax(theta),
        }
    }

    fn to_theta(self, v: &Array1<f64>) -> Theta {
        match self {
            VMap::AbsNormalize => v.clone(),
            VMap::Softmax => safe_softmax_inv(v),
        }
    }
}

/// Outer criterion: optimize-window MSE of the inner QP optimum.
struct OuterCriterion {
    map: VMap,
    qp: QPOptions,
}

impl Criterion for OuterCriterion {
    type Data = MatchingData;

    fn value(&self, theta: &Theta, data: &MatchingData) -> OptResult<f64> {
        let v = self.map.to_v(theta);
        let inner = solve_simplex_qp(&data.x0, &data.x1, &v, &self.qp)?;
        Ok(data.outcome_mse(&inner.w))
    }

    fn check(&self, theta: &Theta, data: &MatchingData) -> OptResult<()> {
        if theta.len() != data.n_predictors() {
            return Err(OptError::GradientDimMismatch {
                expected: data.n_predictors(),
                found: theta.len(),
            });
        }
        if let Some((index, &value)) = theta.iter().enumerate().find(|(_, x)| !x.is_finite()) {
            return Err(OptError::InvalidThetaHat {
                index,
                value,
                reason: "Starting predictor weights must be finite.",
            });
        }
        Ok(())
    }
}

/// Fit predictor and donor weights for `design` with `predictors`.
///
/// Errors
/// ------
/// - `SCMError::MissingData` / `SCMError::Panel` from matrix construction.
/// - `SCMError::Optimization` for inner or outer solver failures.
pub fn fit<S: AsRef<str>>(
    panel: &PanelData, design: &StudyDesign, predictors: &[S], predictors_prior: &YearWindow,
    optimize_window: &YearWindow, opts: &SCMOptions,
) -> SCMResult<FitOutcome> {
    let data = MatchingData::build(
        panel,
        design,
        predictors,
        predictors_prior,
        optimize_window,
        opts.standardize,
    )?;
    fit_matching(&data, opts)
}

/// Fit on pre-built matching matrices.
pub fn fit_matching(data: &MatchingData, opts: &SCMOptions) -> SCMResult<FitOutcome> {
    let wrap = |e: OptError| SCMError::optimization(data.treated, &data.predictors, e);
    let k = data.n_predictors();

    let (v, outer) = if k == 1 || data.n_donors() == 1 {
        let v = uniform(k);
        let inner = solve_simplex_qp(&data.x0, &data.x1, &v, &opts.qp).map_err(wrap)?;
        let outer = OptimOutcome::trivial(v.clone(), data.outcome_mse(&inner.w)).map_err(wrap)?;
        (v, outer)
    } else {
        outer_search(data, opts).map_err(wrap)?
    };

    let inner = solve_simplex_qp(&data.x0, &data.x1, &v, &opts.qp).map_err(wrap)?;
    let loss_w = data.outcome_mse(&inner.w);
    let loss_v = weighted_loss(&data.x0, &data.x1, &v, &inner.w);
    let balance = balance_table(data, &inner.w);
    debug!(
        "fit unit {}: predictors [{}], rmse {:.6}, outer {} ({} iters)",
        data.treated,
        data.predictors.join(", "),
        loss_w.sqrt(),
        outer.status,
        outer.iterations
    );

    let solution = WeightSolution::new(data.donors.clone(), inner.w, data.predictors.clone(), v)?;
    Ok(FitOutcome {
        treated: data.treated,
        solution,
        loss_w,
        pre_rmse: loss_w.sqrt(),
        loss_v,
        balance,
        outer,
    })
}

fn outer_search(data: &MatchingData, opts: &SCMOptions) -> OptResult<(Array1<f64>, OptimOutcome)> {
    let map = VMap::for_method(opts.outer.method);
    let criterion = OuterCriterion { map, qp: opts.qp };

    let starts = match opts.initial_v {
        InitialV::Equal => vec![uniform(data.n_predictors())],
        InitialV::Regression => vec![data.regression_v()?],
        InitialV::Best => {
            let mut starts = vec![uniform(data.n_predictors())];
            match data.regression_v() {
                Ok(v0) => starts.push(v0),
                Err(e) => debug!("unit {}: regression start skipped: {e}", data.treated),
            }
            starts
        }
    };

    let mut best: Option<OptimOutcome> = None;
    for v0 in starts {
        let out = minimize(&criterion, map.to_theta(&v0), data, &opts.outer)?;
        if best.as_ref().map_or(true, |b| out.value < b.value) {
            best = Some(out);
        }
    }
    let best = best.ok_or(OptError::MissingThetaHat)?;
    Ok((map.to_v(&best.theta_hat), best))
}
