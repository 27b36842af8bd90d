//! scm::summary — predictor balance and average treatment effect.
//!
//! Purpose
//! -------
//! Reporting helpers attached to a fit or an effect series:
//!
//! - [`balance_table`]: per predictor, the treated value, its synthetic
//!   counterpart `X0 w`, and the unweighted donor-pool mean, all on the
//!   unscaled predictor means.
//! - [`AttSummary`]: mean, standard error, 95% Student-t interval, and sum
//!   of the post-treatment effects.
use ndarray::{Array1, ArrayView1, Axis};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

use crate::panel::Year;
use crate::scm::{errors::SCMResult, evaluate::EffectSeries, matching::MatchingData};

/// Balance of one predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRow {
    pub predictor: String,
    pub treated: f64,
    pub synthetic: f64,
    pub donor_mean: f64,
}

/// Balance rows in predictor order for donor weights `w`.
pub fn balance_table(data: &MatchingData, w: &Array1<f64>) -> Vec<BalanceRow> {
    let synthetic = data.x0_raw.dot(w);
    let donor_mean = data.x0_raw.mean_axis(Axis(1));
    data.predictors
        .iter()
        .enumerate()
        .map(|(m, name)| BalanceRow {
            predictor: name.clone(),
            treated: data.x1_raw[m],
            synthetic: synthetic[m],
            donor_mean: donor_mean.as_ref().map_or(f64::NAN, |mean| mean[m]),
        })
        .collect()
}

/// Post-treatment effect summary.
///
/// `std_error` and `ci95` need at least two post-treatment years and are
/// `None` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct AttSummary {
    pub n_post: usize,
    pub mean: f64,
    pub std_error: Option<f64>,
    pub ci95: Option<(f64, f64)>,
    pub cumulative: f64,
}

impl AttSummary {
    /// Summarize the effects of `series` from `treatment_year` on.
    ///
    /// Errors
    /// ------
    /// - `PanelError::TreatmentYearOutOfRange` if the series has no years on
    ///   one side of `treatment_year`.
    pub fn from_series(series: &EffectSeries, treatment_year: Year) -> SCMResult<Self> {
        Ok(Self::from_effects(series.post_effects(treatment_year)?))
    }

    /// Summarize a non-empty slice of post-treatment effects.
    pub fn from_effects(effects: ArrayView1<'_, f64>) -> Self {
        let n_post = effects.len();
        let cumulative = effects.sum();
        let mean = cumulative / n_post as f64;
        let (std_error, ci95) = if n_post >= 2 {
            let se = effects.iter().std_dev() / (n_post as f64).sqrt();
            let ci = StudentsT::new(0.0, 1.0, (n_post - 1) as f64)
                .ok()
                .map(|t| t.inverse_cdf(0.975))
                .map(|q| (mean - q * se, mean + q * se));
            (Some(se), ci)
        } else {
            (None, None)
        };
        AttSummary { n_post, mean, std_error, ci95, cumulative }
    }
}
