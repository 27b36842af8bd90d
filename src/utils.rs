//! Conversion helpers for the PyO3 layer: Python inputs into panels,
//! windows, and option structs.
use std::str::FromStr;

use numpy::{IntoPyArray, PyArrayMethods, PyReadonlyArray1};
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

use crate::{
    optimization::{
        criterion_optimizer::{OuterMethod, OuterOptions, Tolerances},
        errors::OptError,
        simplex_qp::QPOptions,
    },
    panel::{Observation, PanelData, StudyWindows, Unit, UnitId, Year, YearWindow},
    scm::{
        DegenerateFitPolicy, InitialV, PlaceboOptions, SCMError, SCMOptions, SearchOptions,
    },
};

fn opt_err(option: &'static str) -> impl Fn(OptError) -> PyErr {
    move |e| SCMError::InvalidOptions { option, reason: e.to_string() }.into()
}

#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Build a [`PanelData`] from a unit registry and long-format columns.
#[allow(clippy::too_many_arguments)]
pub fn build_panel<'py>(
    py: Python<'py>, unit_ids: Vec<UnitId>, unit_names: Vec<String>, obs_units: Vec<UnitId>,
    obs_years: Vec<Year>, obs_variables: Vec<String>, obs_values: &Bound<'py, PyAny>,
    dependent: &str,
) -> PyResult<PanelData> {
    if unit_ids.len() != unit_names.len() {
        return Err(PyValueError::new_err(format!(
            "unit_ids has {} entries but unit_names has {}",
            unit_ids.len(),
            unit_names.len()
        )));
    }
    let values_arr = extract_f64_array(py, obs_values)?;
    let values = values_arr.as_slice().map_err(|_| {
        PyValueError::new_err("values must be a 1-D contiguous float64 array or sequence")
    })?;
    let n = obs_units.len();
    if obs_years.len() != n || obs_variables.len() != n || values.len() != n {
        return Err(PyValueError::new_err(
            "units, years, variables and values must have the same length",
        ));
    }

    let units = unit_ids.into_iter().zip(unit_names).map(|(id, name)| Unit::new(id, name)).collect();
    let observations = obs_units
        .into_iter()
        .zip(obs_years)
        .zip(obs_variables)
        .zip(values.iter().copied())
        .map(|(((unit, year), variable), value)| Observation::new(unit, year, variable, value))
        .collect();

    PanelData::new(units, observations, dependent).map_err(|e| SCMError::from(e).into())
}

/// Build [`StudyWindows`] from inclusive `(first, last)` year ranges.
pub fn build_windows(
    predictors_prior: (Year, Year), optimize_window: (Year, Year), plot_window: (Year, Year),
    treatment_year: Year,
) -> PyResult<StudyWindows> {
    let range = |(a, b): (Year, Year)| YearWindow::range(a, b).map_err(SCMError::from);
    let windows = StudyWindows::new(
        range(predictors_prior)?,
        range(optimize_window)?,
        range(plot_window)?,
        treatment_year,
    )
    .map_err(SCMError::from)?;
    Ok(windows)
}

/// Fit options from Python keyword arguments; `None` keeps the default.
#[allow(clippy::too_many_arguments)]
pub fn extract_scm_options(
    method: Option<&str>, initial_v: Option<&str>, standardize: Option<bool>,
    tol_cost: Option<f64>, max_iter: Option<usize>, lbfgs_mem: Option<usize>,
    qp_max_iter: Option<usize>, qp_tol: Option<f64>,
) -> PyResult<SCMOptions> {
    let defaults = SCMOptions::default();

    let method = match method {
        Some(name) => OuterMethod::from_str(name).map_err(opt_err("method"))?,
        None => defaults.outer.method,
    };
    let tols = Tolerances::new(
        defaults.outer.tols.tol_grad,
        tol_cost.or(defaults.outer.tols.tol_cost),
        max_iter.or(defaults.outer.tols.max_iter),
    )
    .map_err(opt_err("tolerances"))?;
    let outer = OuterOptions::new(tols, method, false, lbfgs_mem).map_err(opt_err("lbfgs_mem"))?;

    let qp = QPOptions::new(
        qp_max_iter.unwrap_or(defaults.qp.max_iter),
        qp_tol.unwrap_or(defaults.qp.tol),
    )
    .map_err(opt_err("qp"))?;

    let initial_v = match initial_v {
        Some(name) => InitialV::from_str(name)?,
        None => defaults.initial_v,
    };

    Ok(SCMOptions::new(outer, initial_v, qp, standardize.unwrap_or(defaults.standardize)))
}

pub fn extract_search_options(
    iterations: usize, min_subset_size: Option<usize>,
) -> PyResult<SearchOptions> {
    let min_size = min_subset_size.unwrap_or(SearchOptions::default().min_subset_size);
    Ok(SearchOptions::new(iterations, min_size)?)
}

pub fn extract_placebo_options(
    degenerate_policy: Option<&str>, pre_mspe_cutoff: Option<f64>,
) -> PyResult<PlaceboOptions> {
    let policy = match degenerate_policy {
        Some(name) => DegenerateFitPolicy::from_str(name)?,
        None => DegenerateFitPolicy::default(),
    };
    Ok(PlaceboOptions::new(policy, pre_mspe_cutoff)?)
}
