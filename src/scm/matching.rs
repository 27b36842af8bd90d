//! scm::matching — predictor and outcome matrices for one fit.
//!
//! Purpose
//! -------
//! Turn a panel, a study design, and a predictor list into the dense inputs
//! of the bilevel weight problem:
//!
//! - `x1` (k) / `x0` (k × J): predictor means over `predictors_prior` for
//!   the treated unit and each donor, optionally standardized.
//! - `z1` (T) / `z0` (T × J): outcomes over `optimize_window`.
//!
//! Key behaviors
//! -------------
//! - Completeness is checked before any arithmetic: every predictor over
//!   `predictors_prior` and the outcome over `optimize_window`, for every
//!   unit of the design. The first gap is returned as `MissingData`.
//! - Standardization divides each predictor row by its sample standard
//!   deviation across treated + donors; rows with zero (or undefined)
//!   spread keep scale 1.
//! - [`MatchingData::regression_v`] derives a data-driven starting point for
//!   the predictor weights.
//!
//! Conventions
//! -----------
//! - Column `d` of `x0`/`z0` belongs to `donors[d]`; row `m` of `x0` to
//!   `predictors[m]`.
//! - Unscaled means are kept in `x1_raw`/`x0_raw` for balance reporting.
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Axis};
use statrs::statistics::Statistics;

use crate::optimization::errors::{OptError, OptResult};
use crate::panel::{PanelData, StudyDesign, UnitId, YearWindow, validate_predictors};
use crate::scm::errors::SCMResult;

/// Standard deviations at or below this keep a unit scale.
const SCALE_FLOOR: f64 = 1e-12;

/// Singular values below `SVD_EPS × σ_max` are dropped in the regression
/// start.
const SVD_EPS: f64 = 1e-12;

/// Dense inputs of one synthetic-control fit.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingData {
    pub treated: UnitId,
    pub donors: Vec<UnitId>,
    pub predictors: Vec<String>,
    pub x1_raw: Array1<f64>,
    pub x0_raw: Array2<f64>,
    pub scale: Array1<f64>,
    pub x1: Array1<f64>,
    pub x0: Array2<f64>,
    pub z1: Array1<f64>,
    pub z0: Array2<f64>,
}

impl MatchingData {
    /// Build the matching matrices.
    ///
    /// Errors
    /// ------
    /// - `SCMError::Panel` for an invalid predictor list.
    /// - `SCMError::MissingData` for the first absent observation.
    pub fn build<S: AsRef<str>>(
        panel: &PanelData, design: &StudyDesign, predictors: &[S], predictors_prior: &YearWindow,
        optimize_window: &YearWindow, standardize: bool,
    ) -> SCMResult<Self> {
        validate_predictors(panel, predictors)?;
        let universe = design.universe();
        panel.require_complete(&universe, predictors_prior, predictors)?;
        panel.require_complete(&universe, optimize_window, &[panel.dependent()])?;

        let names: Vec<String> = predictors.iter().map(|p| p.as_ref().to_string()).collect();
        let treated = design.treated();
        let donors = design.donors().to_vec();
        let (k, j) = (names.len(), donors.len());

        let mut x1_raw = Array1::zeros(k);
        let mut x0_raw = Array2::zeros((k, j));
        for (m, name) in names.iter().enumerate() {
            x1_raw[m] = panel.window_mean(treated, name, predictors_prior)?;
            for (d, &donor) in donors.iter().enumerate() {
                x0_raw[[m, d]] = panel.window_mean(donor, name, predictors_prior)?;
            }
        }

        let scale = if standardize { predictor_scale(&x1_raw, &x0_raw) } else { Array1::ones(k) };
        let x1 = &x1_raw / &scale;
        let x0 = &x0_raw / &scale.view().insert_axis(Axis(1));

        let z1 = panel.outcome_series(treated, optimize_window)?;
        let mut z0 = Array2::zeros((optimize_window.len(), j));
        for (d, &donor) in donors.iter().enumerate() {
            z0.column_mut(d).assign(&panel.outcome_series(donor, optimize_window)?);
        }

        Ok(MatchingData { treated, donors, predictors: names, x1_raw, x0_raw, scale, x1, x0, z1, z0 })
    }

    pub fn n_predictors(&self) -> usize {
        self.predictors.len()
    }

    pub fn n_donors(&self) -> usize {
        self.donors.len()
    }

    /// Mean squared outcome gap over the optimize window for donor weights `w`.
    pub fn outcome_mse(&self, w: &Array1<f64>) -> f64 {
        let gap = &self.z1 - &self.z0.dot(w);
        gap.dot(&gap) / gap.len() as f64
    }

    /// Starting predictor weights `v₀ ∝ diag(BBᵀ)`, where `B` holds the
    /// (non-intercept) least-squares coefficients of each optimize-window
    /// outcome on the scaled predictors across treated + donors.
    ///
    /// Errors
    /// ------
    /// - [`OptError::RegressionStartFailed`] if the SVD solve fails or every
    ///   coefficient is zero.
    pub fn regression_v(&self) -> OptResult<Array1<f64>> {
        let k = self.n_predictors();
        let n_units = self.n_donors() + 1;
        let n_years = self.z1.len();

        let design = DMatrix::from_fn(n_units, k + 1, |i, c| match (i, c) {
            (_, 0) => 1.0,
            (0, c) => self.x1[c - 1],
            (i, c) => self.x0[[c - 1, i - 1]],
        });
        let outcomes = DMatrix::from_fn(n_units, n_years, |i, t| match i {
            0 => self.z1[t],
            i => self.z0[[t, i - 1]],
        });

        let svd = design.svd(true, true);
        let max_sv = svd.singular_values.max();
        let coef = svd
            .solve(&outcomes, SVD_EPS * max_sv.max(1.0))
            .map_err(|reason| OptError::RegressionStartFailed { reason })?;

        let v = Array1::from_iter((1..=k).map(|m| coef.row(m).norm_squared()));
        let total = v.sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(OptError::RegressionStartFailed {
                reason: "regression coefficients are all zero",
            });
        }
        Ok(v / total)
    }
}

fn predictor_scale(x1_raw: &Array1<f64>, x0_raw: &Array2<f64>) -> Array1<f64> {
    Array1::from_iter((0..x1_raw.len()).map(|m| {
        let sd = std::iter::once(x1_raw[m]).chain(x0_raw.row(m).iter().copied()).std_dev();
        if sd.is_finite() && sd > SCALE_FLOOR { sd } else { 1.0 }
    }))
}
