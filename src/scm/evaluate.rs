//! scm::evaluate — counterfactual series for a fitted weight solution.
//!
//! `evaluate` is pure: it reads the panel and the solution and returns a
//! fresh [`EffectSeries`]. Calling it twice with the same inputs yields
//! identical series.
use ndarray::{Array1, Array2, ArrayView1, s};

use crate::panel::{PanelData, PanelError, UnitId, Year, YearWindow};
use crate::scm::{errors::SCMResult, fit::WeightSolution};

/// Actual, synthetic, and effect outcome paths over a plot window.
///
/// - `years` ascending; every array has `years.len()` entries.
/// - `effect[t] = actual[t] − synthetic[t]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectSeries {
    pub unit: UnitId,
    pub years: Vec<Year>,
    pub actual: Array1<f64>,
    pub synthetic: Array1<f64>,
    pub effect: Array1<f64>,
}

impl EffectSeries {
    /// Mean squared effect over years `< treatment_year`.
    pub fn pre_mspe(&self, treatment_year: Year) -> SCMResult<f64> {
        Ok(self.mspe_split(treatment_year)?.0)
    }

    /// Mean squared effect over years `≥ treatment_year`.
    pub fn post_mspe(&self, treatment_year: Year) -> SCMResult<f64> {
        Ok(self.mspe_split(treatment_year)?.1)
    }

    /// `(Pre_MSPE, Post_MSPE)` split at `treatment_year`.
    ///
    /// Errors
    /// ------
    /// - `PanelError::TreatmentYearOutOfRange` if either side is empty.
    pub fn mspe_split(&self, treatment_year: Year) -> SCMResult<(f64, f64)> {
        let (pre, post) = self.split(treatment_year)?;
        Ok((mean_square(pre), mean_square(post)))
    }

    /// Effects over years `≥ treatment_year`.
    pub fn post_effects(&self, treatment_year: Year) -> SCMResult<ArrayView1<'_, f64>> {
        Ok(self.split(treatment_year)?.1)
    }

    fn split(&self, treatment_year: Year) -> SCMResult<(ArrayView1<'_, f64>, ArrayView1<'_, f64>)> {
        let cut = self.years.partition_point(|&y| y < treatment_year);
        if cut == 0 {
            return Err(PanelError::TreatmentYearOutOfRange {
                treatment_year,
                reason: "effect series has no pre-treatment years",
            }
            .into());
        }
        if cut == self.years.len() {
            return Err(PanelError::TreatmentYearOutOfRange {
                treatment_year,
                reason: "effect series has no post-treatment years",
            }
            .into());
        }
        Ok((self.effect.slice(s![..cut]), self.effect.slice(s![cut..])))
    }
}

fn mean_square(x: ArrayView1<'_, f64>) -> f64 {
    x.dot(&x) / x.len() as f64
}

/// Build the synthetic path of `treated` from the donor weights in
/// `solution`.
///
/// Errors
/// ------
/// - `SCMError::MissingData` if the outcome of `treated` or any donor is
///   absent in a year of `plot_window`.
pub fn evaluate(
    panel: &PanelData, treated: UnitId, solution: &WeightSolution, plot_window: &YearWindow,
) -> SCMResult<EffectSeries> {
    let mut units = Vec::with_capacity(solution.donors().len() + 1);
    units.push(treated);
    units.extend_from_slice(solution.donors());
    panel.require_complete(&units, plot_window, &[panel.dependent()])?;

    let actual = panel.outcome_series(treated, plot_window)?;
    let mut z0 = Array2::zeros((plot_window.len(), solution.donors().len()));
    for (d, &donor) in solution.donors().iter().enumerate() {
        z0.column_mut(d).assign(&panel.outcome_series(donor, plot_window)?);
    }
    let synthetic = z0.dot(solution.w());
    let effect = &actual - &synthetic;

    Ok(EffectSeries { unit: treated, years: plot_window.years().to_vec(), actual, synthetic, effect })
}
