//! scm::options — configuration of fits, searches, and placebo runs.
//!
//! Every option struct validates in `new(..)` and has a `Default`; enum
//! choices parse case-insensitively via `FromStr`.
use std::str::FromStr;

use crate::optimization::{criterion_optimizer::OuterOptions, simplex_qp::QPOptions};
use crate::scm::errors::{SCMError, SCMResult};

/// Starting point for the predictor weights `v`.
///
/// - `Equal`: `v₀ = 1/k`.
/// - `Regression`: `v₀ ∝ diag(BBᵀ)` where `B` holds the OLS coefficients of
///   the optimize-window outcomes on the predictors (with intercept).
/// - `Best`: run from both starts and keep the lower outcome loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialV {
    #[default]
    Equal,
    Regression,
    Best,
}

impl FromStr for InitialV {
    type Err = SCMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "equal" => Ok(InitialV::Equal),
            "regression" | "ols" => Ok(InitialV::Regression),
            "best" => Ok(InitialV::Best),
            _ => Err(SCMError::InvalidOptions {
                option: "initial_v",
                reason: format!("unknown start '{s}'; use 'equal', 'regression' or 'best'"),
            }),
        }
    }
}

/// Options of a single synthetic-control fit.
///
/// Default: Nelder–Mead outer search, equal starting weights, default QP
/// options, standardized predictors.
#[derive(Debug, Clone, PartialEq)]
pub struct SCMOptions {
    pub outer: OuterOptions,
    pub initial_v: InitialV,
    pub qp: QPOptions,
    /// Divide each predictor by its cross-unit sample standard deviation.
    pub standardize: bool,
}

impl SCMOptions {
    pub fn new(outer: OuterOptions, initial_v: InitialV, qp: QPOptions, standardize: bool) -> Self {
        Self { outer, initial_v, qp, standardize }
    }
}

impl Default for SCMOptions {
    fn default() -> Self {
        Self {
            outer: OuterOptions::default(),
            initial_v: InitialV::default(),
            qp: QPOptions::default(),
            standardize: true,
        }
    }
}

/// Randomized predictor-subset search settings.
///
/// - `iterations`: number of trials (≥ 1).
/// - `min_subset_size`: lower bound of the subset size draw (≥ 1); clamped
///   to the candidate count when larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub iterations: usize,
    pub min_subset_size: usize,
}

impl SearchOptions {
    pub fn new(iterations: usize, min_subset_size: usize) -> SCMResult<Self> {
        if iterations == 0 {
            return Err(SCMError::InvalidOptions {
                option: "iterations",
                reason: "must be at least 1".to_string(),
            });
        }
        if min_subset_size == 0 {
            return Err(SCMError::InvalidOptions {
                option: "min_subset_size",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self { iterations, min_subset_size })
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { iterations: 100, min_subset_size: 4 }
    }
}

/// What to do with a placebo unit whose pre-treatment MSPE is numerically zero
/// (see [`crate::scm::DEGENERATE_MSPE`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateFitPolicy {
    /// Abort the placebo run with [`SCMError::DegenerateFit`].
    Fail,
    /// Ratio is `+∞`; the unit ranks above every finite ratio.
    #[default]
    Infinite,
    /// Drop the unit and record the reason.
    Exclude,
}

impl FromStr for DegenerateFitPolicy {
    type Err = SCMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(DegenerateFitPolicy::Fail),
            "infinite" | "inf" => Ok(DegenerateFitPolicy::Infinite),
            "exclude" => Ok(DegenerateFitPolicy::Exclude),
            _ => Err(SCMError::InvalidOptions {
                option: "degenerate_policy",
                reason: format!("unknown policy '{s}'; use 'fail', 'infinite' or 'exclude'"),
            }),
        }
    }
}

/// Placebo inference settings.
///
/// - `degenerate_policy`: handling of `Pre_MSPE = 0`.
/// - `pre_mspe_cutoff`: when `Some(k)`, placebo units with
///   `Pre_MSPE > k × Pre_MSPE(treated)` are excluded. Never applied to the
///   treated unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaceboOptions {
    pub degenerate_policy: DegenerateFitPolicy,
    pub pre_mspe_cutoff: Option<f64>,
}

impl PlaceboOptions {
    pub fn new(
        degenerate_policy: DegenerateFitPolicy, pre_mspe_cutoff: Option<f64>,
    ) -> SCMResult<Self> {
        if let Some(k) = pre_mspe_cutoff {
            if !k.is_finite() || k <= 0.0 {
                return Err(SCMError::InvalidOptions {
                    option: "pre_mspe_cutoff",
                    reason: format!("{k} must be finite and > 0"),
                });
            }
        }
        Ok(Self { degenerate_policy, pre_mspe_cutoff })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation in `SearchOptions::new` and `PlaceboOptions::new`.
    // - Parsing of `InitialV` and `DegenerateFitPolicy`.
    // - Defaults.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure zero iterations / subset sizes and bad cutoffs are rejected.
    //
    // Given
    // -----
    // - iterations = 0, min_subset_size = 0, cutoff ∈ {0, NaN}.
    //
    // Expect
    // ------
    // - `InvalidOptions` naming the offending option.
    fn invalid_options_are_rejected() {
        assert!(matches!(
            SearchOptions::new(0, 4),
            Err(SCMError::InvalidOptions { option: "iterations", .. })
        ));
        assert!(matches!(
            SearchOptions::new(10, 0),
            Err(SCMError::InvalidOptions { option: "min_subset_size", .. })
        ));
        for k in [0.0, f64::NAN] {
            assert!(matches!(
                PlaceboOptions::new(DegenerateFitPolicy::Infinite, Some(k)),
                Err(SCMError::InvalidOptions { option: "pre_mspe_cutoff", .. })
            ));
        }
        assert!(PlaceboOptions::new(DegenerateFitPolicy::Exclude, Some(5.0)).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Verify case-insensitive parsing and defaults.
    //
    // Given
    // -----
    // - "BEST", "Exclude", "nope".
    //
    // Expect
    // ------
    // - Best, Exclude, error; defaults Equal / Infinite / standardize = true.
    fn parsing_and_defaults() {
        assert_eq!("BEST".parse::<InitialV>().unwrap(), InitialV::Best);
        assert_eq!("Exclude".parse::<DegenerateFitPolicy>().unwrap(), DegenerateFitPolicy::Exclude);
        assert!("nope".parse::<DegenerateFitPolicy>().is_err());

        let opts = SCMOptions::default();
        assert_eq!(opts.initial_v, InitialV::Equal);
        assert!(opts.standardize);
        assert_eq!(PlaceboOptions::default().degenerate_policy, DegenerateFitPolicy::Infinite);
        assert_eq!(SearchOptions::default().min_subset_size, 4);
    }
}
