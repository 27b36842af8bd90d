use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Implies that FD should be used
    GradientNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- Outer options ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost {
        tol: f64,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid outer method or line searcher name.
    InvalidMethod {
        name: String,
        reason: &'static str,
    },

    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem {
        mem: usize,
        reason: &'static str,
    },

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Theta hat is missing
    MissingThetaHat,

    // ---- Simplex QP ----
    /// The donor pool is empty, so the simplex is empty.
    EmptyDonorPool,

    /// Design matrix and target vector disagree in their row count.
    QPDimMismatch {
        rows: usize,
        target: usize,
    },

    /// Predictor weight vector length disagrees with the design matrix.
    QPWeightDimMismatch {
        expected: usize,
        found: usize,
    },

    /// QP input contains a non-finite value.
    QPNonFiniteInput {
        what: &'static str,
    },

    /// QP iteration cap reached before either stopping test was met.
    QPNotConverged {
        iterations: usize,
        step: f64,
        gap: f64,
    },

    /// QP tolerance needs to be positive and finite.
    InvalidQPTol {
        tol: f64,
    },

    /// QP iteration cap needs to be positive.
    InvalidQPMaxIter {
        max_iter: usize,
    },

    // ---- Initial predictor weights ----
    /// Regression-based starting weights could not be computed.
    RegressionStartFailed {
        reason: &'static str,
    },

    // ---- Argmin ----
    /// An error raised by the Argmin backend. `kind` names the
    /// `ArgminError` variant, or is `"backend"` for foreign errors.
    Solver {
        kind: &'static str,
        text: String,
    },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Gradient optimization not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- Outer options ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            OptError::InvalidMethod { name, reason } => {
                write!(f, "Invalid optimization method '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- Simplex QP ----
            OptError::EmptyDonorPool => {
                write!(f, "Donor weight QP is infeasible: donor pool is empty")
            }
            OptError::QPDimMismatch { rows, target } => {
                write!(f, "QP dimension mismatch: design has {rows} rows, target has {target}")
            }
            OptError::QPWeightDimMismatch { expected, found } => {
                write!(f, "Predictor weight length mismatch: expected {expected}, found {found}")
            }
            OptError::QPNonFiniteInput { what } => {
                write!(f, "QP input '{what}' contains non-finite values")
            }
            OptError::QPNotConverged { iterations, step, gap } => {
                write!(
                    f,
                    "Donor weight QP did not converge within {iterations} iterations \
                     (last step {step:e}, duality gap {gap:e})"
                )
            }
            OptError::InvalidQPTol { tol } => {
                write!(f, "Invalid QP tolerance {tol}, must be finite and > 0")
            }
            OptError::InvalidQPMaxIter { max_iter } => {
                write!(f, "Invalid QP iteration cap {max_iter}, must be > 0")
            }

            // ---- Initial predictor weights ----
            OptError::RegressionStartFailed { reason } => {
                write!(f, "Regression-based starting weights failed: {reason}")
            }

            // ---- Argmin ----
            OptError::Solver { kind, text } => {
                write!(f, "Outer solver error ({kind}): {text}")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Errors raised inside our own cost functions travel through argmin
        // boxed; recover them before falling back to argmin's own variants.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        let (kind, text) = match original_err.downcast::<ArgminError>() {
            Ok(ArgminError::InvalidParameter { text }) => ("invalid parameter", text),
            Ok(ArgminError::NotImplemented { text }) => ("not implemented", text),
            Ok(ArgminError::NotInitialized { text }) => ("not initialized", text),
            Ok(ArgminError::ConditionViolated { text }) => ("condition violated", text),
            Ok(ArgminError::CheckpointNotFound { text }) => ("checkpoint not found", text),
            Ok(ArgminError::PotentialBug { text }) => ("potential bug", text),
            Ok(ArgminError::ImpossibleError { text }) => ("impossible error", text),
            Ok(other) => ("argmin", other.to_string()),
            Err(err) => ("backend", err.to_string()),
        };
        OptError::Solver { kind, text }
    }
}
