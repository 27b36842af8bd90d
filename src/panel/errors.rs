//! panel::errors — construction and lookup failures for panel data.
//!
//! Purpose
//! -------
//! Provide the error enum and result alias used by the panel container, the
//! time-window descriptors, and the study-design validation. Every variant
//! carries the identifiers needed to locate the problem (unit id, year,
//! variable name) so callers can report it without re-deriving context.
//!
//! Conventions
//! -----------
//! - Unit ids and years are reported exactly as supplied by the caller.
//! - Missing observations are **never** imputed or skipped; the first absent
//!   `(unit, year, variable)` triple encountered by a completeness check is
//!   reported as [`PanelError::MissingData`].
//! - Messages are phrased in terms of domain constraints ("treated unit must
//!   not be a donor") rather than container internals.
use crate::panel::data::{UnitId, Year};

/// Result alias for panel, window, and design operations.
pub type PanelResult<T> = Result<T, PanelError>;

/// Unified error type for the panel layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelError {
    // ---- Panel construction ----
    /// Two units share the same integer id.
    DuplicateUnit { unit: UnitId },

    /// An observation references a unit that was not registered.
    UnknownUnit { unit: UnitId },

    /// The same `(unit, year, variable)` appears more than once.
    DuplicateObservation { unit: UnitId, year: Year, variable: String },

    /// An observation value is NaN or ±∞.
    NonFiniteValue { unit: UnitId, year: Year, variable: String, value: f64 },

    /// The dependent variable has no observation at all.
    UnknownDependent { variable: String },

    // ---- Lookup ----
    /// A variable name is not present anywhere in the panel.
    UnknownVariable { variable: String },

    /// A required observation is absent.
    MissingData { unit: UnitId, year: Year, variable: String },

    // ---- Windows ----
    /// A year window contains no years.
    EmptyWindow { window: &'static str },

    /// `optimize_window` contains a year outside `plot_window`.
    WindowNotContained { window: &'static str, year: Year },

    /// `optimize_window` contains a year at or after the treatment year.
    OptimizeAfterTreatment { year: Year, treatment_year: Year },

    /// The treatment year leaves the pre- or post-period of `plot_window`
    /// empty.
    TreatmentYearOutOfRange { treatment_year: Year, reason: &'static str },

    // ---- Study design ----
    /// The donor pool is empty.
    EmptyDonorPool,

    /// The treated unit also appears in the donor pool.
    TreatedInDonorPool { unit: UnitId },

    /// A donor id appears more than once.
    DuplicateDonor { unit: UnitId },

    // ---- Predictor sets ----
    /// The predictor set is empty.
    EmptyPredictorSet,

    /// A predictor name appears more than once.
    DuplicatePredictor { variable: String },

    /// The dependent variable was listed as a predictor.
    DependentAsPredictor { variable: String },
}

impl std::error::Error for PanelError {}

impl std::fmt::Display for PanelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Panel construction ----
            PanelError::DuplicateUnit { unit } => {
                write!(f, "Duplicate unit id {unit}")
            }
            PanelError::UnknownUnit { unit } => {
                write!(f, "Unknown unit id {unit}")
            }
            PanelError::DuplicateObservation { unit, year, variable } => {
                write!(f, "Duplicate observation for unit {unit}, year {year}, variable '{variable}'")
            }
            PanelError::NonFiniteValue { unit, year, variable, value } => {
                write!(
                    f,
                    "Non-finite value {value} for unit {unit}, year {year}, variable '{variable}'"
                )
            }
            PanelError::UnknownDependent { variable } => {
                write!(f, "Dependent variable '{variable}' has no observations")
            }

            // ---- Lookup ----
            PanelError::UnknownVariable { variable } => {
                write!(f, "Unknown variable '{variable}'")
            }
            PanelError::MissingData { unit, year, variable } => {
                write!(f, "Missing observation for unit {unit}, year {year}, variable '{variable}'")
            }

            // ---- Windows ----
            PanelError::EmptyWindow { window } => {
                write!(f, "Window '{window}' must contain at least one year")
            }
            PanelError::WindowNotContained { window, year } => {
                write!(f, "Year {year} of window '{window}' is not part of the plot window")
            }
            PanelError::OptimizeAfterTreatment { year, treatment_year } => {
                write!(
                    f,
                    "Optimize window year {year} is not before the treatment year {treatment_year}"
                )
            }
            PanelError::TreatmentYearOutOfRange { treatment_year, reason } => {
                write!(f, "Invalid treatment year {treatment_year}: {reason}")
            }

            // ---- Study design ----
            PanelError::EmptyDonorPool => {
                write!(f, "Donor pool must contain at least one unit")
            }
            PanelError::TreatedInDonorPool { unit } => {
                write!(f, "Treated unit {unit} must not be part of the donor pool")
            }
            PanelError::DuplicateDonor { unit } => {
                write!(f, "Donor {unit} appears more than once in the donor pool")
            }

            // ---- Predictor sets ----
            PanelError::EmptyPredictorSet => {
                write!(f, "Predictor set must contain at least one variable")
            }
            PanelError::DuplicatePredictor { variable } => {
                write!(f, "Predictor '{variable}' appears more than once")
            }
            PanelError::DependentAsPredictor { variable } => {
                write!(f, "Dependent variable '{variable}' cannot be used as a predictor")
            }
        }
    }
}
