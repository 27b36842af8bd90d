//! Study design: treated unit, donor pool, and predictor sets.
//!
//! Purpose
//! -------
//! Assign roles to units and validate predictor lists against a panel
//! before any optimization runs, so the numeric layers can assume a
//! well-formed problem.
//!
//! Key behaviors
//! -------------
//! - [`StudyDesign::new`] checks that the treated unit exists, the donor pool
//!   is non-empty, donors are distinct, registered, and exclude the treated
//!   unit.
//! - [`StudyDesign::placebo`] re-labels one unit of the full universe as
//!   treated and returns the remaining units as its donor pool.
//! - [`validate_predictors`] enforces a non-empty list of distinct, known,
//!   non-dependent variable names.
use std::collections::HashSet;

use crate::panel::{
    data::{PanelData, UnitId},
    errors::{PanelError, PanelResult},
};

/// Role of a unit within one study design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitRole {
    Treated,
    Donor,
}

/// StudyDesign — one treated unit and its donor pool.
///
/// Invariants
/// ----------
/// - `donors` is non-empty, duplicate-free, and does not contain `treated`.
/// - Every id is registered in the panel used for validation.
/// - Donor order is preserved; it fixes the order of the weight vector `w`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyDesign {
    treated: UnitId,
    donors: Vec<UnitId>,
}

impl StudyDesign {
    /// Validate a design against `panel`.
    ///
    /// Errors
    /// ------
    /// - [`PanelError::UnknownUnit`] for unregistered ids.
    /// - [`PanelError::EmptyDonorPool`], [`PanelError::TreatedInDonorPool`],
    ///   [`PanelError::DuplicateDonor`] for malformed pools.
    pub fn new(panel: &PanelData, treated: UnitId, donors: Vec<UnitId>) -> PanelResult<Self> {
        if !panel.contains_unit(treated) {
            return Err(PanelError::UnknownUnit { unit: treated });
        }
        Self::check_pool(treated, &donors)?;
        for &d in &donors {
            if !panel.contains_unit(d) {
                return Err(PanelError::UnknownUnit { unit: d });
            }
        }
        Ok(StudyDesign { treated, donors })
    }

    fn check_pool(treated: UnitId, donors: &[UnitId]) -> PanelResult<()> {
        if donors.is_empty() {
            return Err(PanelError::EmptyDonorPool);
        }
        let mut seen = HashSet::with_capacity(donors.len());
        for &d in donors {
            if d == treated {
                return Err(PanelError::TreatedInDonorPool { unit: d });
            }
            if !seen.insert(d) {
                return Err(PanelError::DuplicateDonor { unit: d });
            }
        }
        Ok(())
    }

    pub fn treated(&self) -> UnitId {
        self.treated
    }

    pub fn donors(&self) -> &[UnitId] {
        &self.donors
    }

    /// Treated unit followed by the donors.
    pub fn universe(&self) -> Vec<UnitId> {
        std::iter::once(self.treated).chain(self.donors.iter().copied()).collect()
    }

    pub fn role_of(&self, unit: UnitId) -> Option<UnitRole> {
        if unit == self.treated {
            Some(UnitRole::Treated)
        } else if self.donors.contains(&unit) {
            Some(UnitRole::Donor)
        } else {
            None
        }
    }

    /// Design in which `unit` is treated and every other member of the
    /// universe is a donor.
    ///
    /// Errors
    /// ------
    /// - [`PanelError::UnknownUnit`] if `unit` is not in the universe.
    /// - [`PanelError::EmptyDonorPool`] if the universe has a single unit.
    pub fn placebo(&self, unit: UnitId) -> PanelResult<StudyDesign> {
        if self.role_of(unit).is_none() {
            return Err(PanelError::UnknownUnit { unit });
        }
        let donors: Vec<UnitId> = self.universe().into_iter().filter(|&u| u != unit).collect();
        Self::check_pool(unit, &donors)?;
        Ok(StudyDesign { treated: unit, donors })
    }
}

/// Validate a predictor list against `panel`.
///
/// Errors
/// ------
/// - [`PanelError::EmptyPredictorSet`] if `predictors` is empty.
/// - [`PanelError::DependentAsPredictor`] if the outcome is listed.
/// - [`PanelError::DuplicatePredictor`] for repeated names.
/// - [`PanelError::UnknownVariable`] for names absent from the panel.
pub fn validate_predictors<S: AsRef<str>>(panel: &PanelData, predictors: &[S]) -> PanelResult<()> {
    if predictors.is_empty() {
        return Err(PanelError::EmptyPredictorSet);
    }
    let mut seen = HashSet::with_capacity(predictors.len());
    for p in predictors {
        let name = p.as_ref();
        if name == panel.dependent() {
            return Err(PanelError::DependentAsPredictor { variable: name.to_string() });
        }
        if !seen.insert(name) {
            return Err(PanelError::DuplicatePredictor { variable: name.to_string() });
        }
        if !panel.contains_variable(name) {
            return Err(PanelError::UnknownVariable { variable: name.to_string() });
        }
    }
    Ok(())
}
