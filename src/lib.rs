//! rust_scm — synthetic control estimation with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the synthetic-control study pipeline to Python via the `_rust_scm`
//! extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`panel`, `optimization`, `scm`) as the
//!   public crate surface.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_rust_scm` Python extension when the `python-bindings` feature is on.
//! - Register the `synthetic_control` submodule under `rust_scm` so that
//!   dot-notation imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner Rust modules; this file performs
//!   only FFI glue, input validation, and error mapping.
//! - Panels handed to Python are immutable; each `run` call builds a fresh
//!   study over the stored panel.
//!
//! Conventions
//! -----------
//! - Years are inclusive `(first, last)` tuples on the Python side.
//! - Every Rust error reaches Python as `ValueError` with the error's
//!   `Display` message.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code depends on [`scm`] and [`panel`] directly and can ignore
//!   the items guarded by `python-bindings`.
//! - The report layer imports `_rust_scm.synthetic_control` and reads plain
//!   lists and floats from [`StudyResult`].
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by
//!   `tests/integration_scm_pipeline.rs`.

pub mod optimization;
pub mod panel;
pub mod scm;

#[cfg(feature = "python-bindings")]
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    panel::{PanelData, StudyDesign, StudyWindows, UnitId, Year},
    scm::{PlaceboOptions, SCMOptions, SearchOptions, StudyReport, SyntheticControlStudy},
    utils::{
        build_panel, build_windows, extract_placebo_options, extract_scm_options,
        extract_search_options,
    },
};

/// SyntheticControl — Python-facing synthetic-control study.
///
/// Purpose
/// -------
/// Hold a validated panel, study design, timeline, and options, and run the
/// full search → fit → evaluation → placebo pipeline on demand.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `SyntheticControl(unit_ids, unit_names, units, years, variables, values,
/// dependent, treated, donors, predictors_prior, optimize_window,
/// plot_window, treatment_year, ...)`:
/// - `unit_ids`, `unit_names`: the unit registry.
/// - `units`, `years`, `variables`, `values`: long-format observation
///   columns of equal length.
/// - `dependent`: outcome variable name.
/// - `treated`, `donors`: study design.
/// - `predictors_prior`, `optimize_window`, `plot_window`: inclusive
///   `(first, last)` year ranges; `treatment_year` the first treated year.
/// - Optional: `method` ('NelderMead', 'LBFGS', 'LBFGS-HagerZhang',
///   'LBFGS-MoreThuente'), `initial_v` ('equal', 'regression', 'best'),
///   `standardize`, `tol_cost`, `max_iter`, `lbfgs_mem`, `qp_max_iter`,
///   `qp_tol`, `degenerate_policy` ('fail', 'infinite', 'exclude'),
///   `pre_mspe_cutoff`.
///
/// Invariants
/// ----------
/// - `panel`, `design`, and `windows` passed validation at construction.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_scm.synthetic_control")]
pub struct SyntheticControl {
    panel: PanelData,
    design: StudyDesign,
    windows: StudyWindows,
    fit_opts: SCMOptions,
    placebo_opts: PlaceboOptions,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl SyntheticControl {
    #[new]
    #[pyo3(
        signature = (
            unit_ids,
            unit_names,
            units,
            years,
            variables,
            values,
            dependent,
            treated,
            donors,
            predictors_prior,
            optimize_window,
            plot_window,
            treatment_year,
            method = None,
            initial_v = None,
            standardize = None,
            tol_cost = None,
            max_iter = None,
            lbfgs_mem = None,
            qp_max_iter = None,
            qp_tol = None,
            degenerate_policy = None,
            pre_mspe_cutoff = None,
        ),
        text_signature = "(unit_ids, unit_names, units, years, variables, values, dependent, \
                          treated, donors, predictors_prior, optimize_window, plot_window, \
                          treatment_year, /, method='NelderMead', initial_v='equal', \
                          standardize=True, tol_cost=None, max_iter=None, lbfgs_mem=None, \
                          qp_max_iter=None, qp_tol=None, degenerate_policy='infinite', \
                          pre_mspe_cutoff=None)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new<'py>(
        py: Python<'py>, unit_ids: Vec<UnitId>, unit_names: Vec<String>, units: Vec<UnitId>,
        years: Vec<Year>, variables: Vec<String>, values: &Bound<'py, PyAny>, dependent: &str,
        treated: UnitId, donors: Vec<UnitId>, predictors_prior: (Year, Year),
        optimize_window: (Year, Year), plot_window: (Year, Year), treatment_year: Year,
        method: Option<&str>, initial_v: Option<&str>, standardize: Option<bool>,
        tol_cost: Option<f64>, max_iter: Option<usize>, lbfgs_mem: Option<usize>,
        qp_max_iter: Option<usize>, qp_tol: Option<f64>, degenerate_policy: Option<&str>,
        pre_mspe_cutoff: Option<f64>,
    ) -> PyResult<Self> {
        let panel = build_panel(py, unit_ids, unit_names, units, years, variables, values, dependent)?;
        let design = StudyDesign::new(&panel, treated, donors).map_err(scm::SCMError::from)?;
        let windows = build_windows(predictors_prior, optimize_window, plot_window, treatment_year)?;
        let fit_opts = extract_scm_options(
            method,
            initial_v,
            standardize,
            tol_cost,
            max_iter,
            lbfgs_mem,
            qp_max_iter,
            qp_tol,
        )?;
        let placebo_opts = extract_placebo_options(degenerate_policy, pre_mspe_cutoff)?;
        Ok(SyntheticControl { panel, design, windows, fit_opts, placebo_opts })
    }

    /// Run the study with `iterations` random predictor subsets drawn from
    /// `candidates` using a ChaCha8 stream seeded with `seed`.
    #[pyo3(
        signature = (candidates, iterations, seed, min_subset_size = None),
        text_signature = "(self, candidates, iterations, seed, /, min_subset_size=4)"
    )]
    pub fn run(
        &self, py: Python<'_>, candidates: Vec<String>, iterations: usize, seed: u64,
        min_subset_size: Option<usize>,
    ) -> PyResult<StudyResult> {
        let search_opts: SearchOptions = extract_search_options(iterations, min_subset_size)?;
        let study = SyntheticControlStudy::new(
            &self.panel,
            self.design.clone(),
            self.windows.clone(),
            candidates,
        )
        .with_fit_options(self.fit_opts.clone())
        .with_search_options(search_opts)
        .with_placebo_options(self.placebo_opts);

        let report = py.allow_threads(|| study.run_seeded(seed))?;
        Ok(StudyResult { inner: report })
    }
}

/// StudyResult — read-only view of a [`StudyReport`] for Python.
///
/// Instances are produced by `SyntheticControl.run`; getters copy into
/// Python-owned lists.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_scm.synthetic_control")]
pub struct StudyResult {
    pub inner: StudyReport,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl StudyResult {
    #[getter]
    pub fn best_predictors(&self) -> Vec<String> {
        self.inner.search.best_predictors.clone()
    }

    #[getter]
    pub fn best_rmse(&self) -> f64 {
        self.inner.search.best_rmse
    }

    #[getter]
    pub fn donors(&self) -> Vec<UnitId> {
        self.inner.fit.solution.donors().to_vec()
    }

    #[getter]
    pub fn donor_weights(&self) -> Vec<f64> {
        self.inner.fit.solution.w().to_vec()
    }

    #[getter]
    pub fn predictor_weights(&self) -> Vec<f64> {
        self.inner.fit.solution.v().to_vec()
    }

    #[getter]
    pub fn loss_v(&self) -> f64 {
        self.inner.fit.loss_v
    }

    /// `(predictor, treated, synthetic, donor_mean)` per predictor.
    #[getter]
    pub fn balance(&self) -> Vec<(String, f64, f64, f64)> {
        self.inner
            .fit
            .balance
            .iter()
            .map(|r| (r.predictor.clone(), r.treated, r.synthetic, r.donor_mean))
            .collect()
    }

    #[getter]
    pub fn years(&self) -> Vec<Year> {
        self.inner.effects.years.clone()
    }

    #[getter]
    pub fn actual(&self) -> Vec<f64> {
        self.inner.effects.actual.to_vec()
    }

    #[getter]
    pub fn synthetic(&self) -> Vec<f64> {
        self.inner.effects.synthetic.to_vec()
    }

    #[getter]
    pub fn effect(&self) -> Vec<f64> {
        self.inner.effects.effect.to_vec()
    }

    #[getter]
    pub fn att(&self) -> f64 {
        self.inner.att.mean
    }

    #[getter]
    pub fn att_std_error(&self) -> Option<f64> {
        self.inner.att.std_error
    }

    #[getter]
    pub fn att_ci95(&self) -> Option<(f64, f64)> {
        self.inner.att.ci95
    }

    #[getter]
    pub fn cumulative_effect(&self) -> f64 {
        self.inner.att.cumulative
    }

    /// `(unit, pre_mspe, post_mspe, ratio, rank)` in ranking order.
    #[getter]
    pub fn ranking(&self) -> Vec<(UnitId, f64, f64, f64, usize)> {
        self.inner
            .placebo
            .ranking
            .iter()
            .map(|e| (e.unit, e.pre_mspe, e.post_mspe, e.ratio, e.rank))
            .collect()
    }

    /// `(unit, reason)` for every placebo unit left out of the ranking.
    #[getter]
    pub fn excluded(&self) -> Vec<(UnitId, String)> {
        self.inner.placebo.excluded.iter().map(|x| (x.unit, x.reason.to_string())).collect()
    }

    #[getter]
    pub fn treated_rank(&self) -> usize {
        self.inner.placebo.treated_rank
    }

    #[getter]
    pub fn p_value(&self) -> f64 {
        self.inner.placebo.p_value
    }

    #[getter]
    pub fn is_complete(&self) -> bool {
        self.inner.completeness.is_complete()
    }

    #[getter]
    pub fn incomplete_reasons(&self) -> Vec<String> {
        match &self.inner.completeness {
            scm::Completeness::Complete => Vec::new(),
            scm::Completeness::Incomplete { reasons } => reasons.clone(),
        }
    }
}

/// _rust_scm — PyO3 module initializer for the Python extension.
///
/// Creates the `synthetic_control` submodule, attaches it to `_rust_scm`,
/// and registers it in `sys.modules` as `rust_scm.synthetic_control`.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_scm<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let synthetic_control_mod = PyModule::new(_py, "synthetic_control")?;
    synthetic_control(_py, m, &synthetic_control_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_scm.synthetic_control", synthetic_control_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn synthetic_control<'py>(
    _py: Python, rust_scm: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<SyntheticControl>()?;
    m.add_class::<StudyResult>()?;
    rust_scm.add_submodule(m)?;
    Ok(())
}
