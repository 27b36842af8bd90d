//! scm::errors — failure taxonomy of a synthetic-control study.
//!
//! Purpose
//! -------
//! Attach study context (unit, predictor subset, trial index) to the
//! lower-level [`PanelError`] and [`OptError`] values so a caller can tell
//! exactly which fit failed and why.
//!
//! Conventions
//! -----------
//! - Absent observations always surface as [`SCMError::MissingData`], never
//!   as a generic panel error.
//! - Solver failures are wrapped in [`SCMError::Optimization`] together with
//!   the unit that was being fitted and the predictor names in use.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::optimization::errors::OptError;
use crate::panel::{PanelError, UnitId, Year};

/// Result alias for synthetic-control operations.
pub type SCMResult<T> = Result<T, SCMError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SCMError {
    /// A required observation is absent.
    MissingData { unit: UnitId, year: Year, variable: String },

    /// The weight optimization failed for `unit` with `predictors`.
    Optimization { unit: UnitId, predictors: Vec<String>, source: OptError },

    /// Pre-treatment MSPE of `unit` is zero and the placebo policy is `Fail`.
    DegenerateFit { unit: UnitId, pre_mspe: f64 },

    /// Any other panel, window, or design violation.
    Panel(PanelError),

    /// Option struct rejected at construction.
    InvalidOptions { option: &'static str, reason: String },

    /// A weight solution whose shapes or simplex constraints do not hold.
    InvalidSolution { reason: String },

    /// Every predictor-search trial failed; `source` is the failure of
    /// trial `first_trial`.
    AllTrialsFailed { trials: usize, first_trial: usize, source: Box<SCMError> },

    /// The treated unit has no placebo ratio, so no rank or p-value exists.
    TreatedNotRanked { unit: UnitId, reason: String },
}

impl std::error::Error for SCMError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SCMError::Optimization { source, .. } => Some(source),
            SCMError::Panel(source) => Some(source),
            SCMError::AllTrialsFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl std::fmt::Display for SCMError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SCMError::MissingData { unit, year, variable } => {
                write!(f, "Missing observation for unit {unit}, year {year}, variable '{variable}'")
            }
            SCMError::Optimization { unit, predictors, source } => {
                write!(
                    f,
                    "Weight optimization failed for unit {unit} with predictors [{}]: {source}",
                    predictors.join(", ")
                )
            }
            SCMError::DegenerateFit { unit, pre_mspe } => {
                write!(
                    f,
                    "Degenerate fit for unit {unit}: pre-treatment MSPE is {pre_mspe}, ratio undefined"
                )
            }
            SCMError::Panel(err) => write!(f, "{err}"),
            SCMError::InvalidOptions { option, reason } => {
                write!(f, "Invalid option '{option}': {reason}")
            }
            SCMError::InvalidSolution { reason } => {
                write!(f, "Invalid weight solution: {reason}")
            }
            SCMError::AllTrialsFailed { trials, first_trial, source } => {
                write!(f, "All {trials} search trials failed; trial {first_trial}: {source}")
            }
            SCMError::TreatedNotRanked { unit, reason } => {
                write!(f, "Treated unit {unit} could not be ranked: {reason}")
            }
        }
    }
}

impl From<PanelError> for SCMError {
    fn from(err: PanelError) -> Self {
        match err {
            PanelError::MissingData { unit, year, variable } => {
                SCMError::MissingData { unit, year, variable }
            }
            other => SCMError::Panel(other),
        }
    }
}

/// Convert an [`SCMError`] into a Python `ValueError` carrying its message.
#[cfg(feature = "python-bindings")]
impl From<SCMError> for PyErr {
    fn from(err: SCMError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

impl SCMError {
    /// Wrap a solver failure with the unit and predictor context.
    pub fn optimization<S: AsRef<str>>(unit: UnitId, predictors: &[S], source: OptError) -> Self {
        SCMError::Optimization {
            unit,
            predictors: predictors.iter().map(|p| p.as_ref().to_string()).collect(),
            source,
        }
    }
}
