//! Panel data container for synthetic-control estimation.
//!
//! Purpose
//! -------
//! Provide a validated, immutable, long-format table of
//! `(unit, year, variable) → value` observations together with the unit
//! registry and the name of the dependent (outcome) variable. Every other
//! component of the crate reads from this container and never mutates it.
//!
//! Key behaviors
//! -------------
//! - [`PanelData::new`] rejects duplicate units, duplicate observations,
//!   observations for unregistered units, and non-finite values.
//! - Variable names are interned once so lookups hash a small integer key.
//! - [`PanelData::require_complete`] checks a full cross product of units,
//!   years, and variables and reports the first absent triple as
//!   [`PanelError::MissingData`].
//!
//! Invariants & assumptions
//! ------------------------
//! - For a given `(unit, year)`, each variable appears at most once.
//! - Every stored value is finite.
//! - The dependent variable has at least one observation.
//!
//! Conventions
//! -----------
//! - Unit ids are caller-assigned integers ([`UnitId`]); years are calendar
//!   integers ([`Year`]).
//! - Absent observations are simply not stored. Callers that read CSV or API
//!   data with gaps must omit those cells rather than encode them as NaN.
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction failures, lookups, completeness checks,
//!   and window aggregation helpers.
use std::collections::{BTreeMap, BTreeSet, HashMap};

use ndarray::Array1;

use crate::panel::{
    errors::{PanelError, PanelResult},
    window::YearWindow,
};

/// Integer identifier of a unit (country, region, firm).
pub type UnitId = u32;

/// Calendar year used as the panel's time index.
pub type Year = i32;

/// A registered unit with its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
}

impl Unit {
    pub fn new(id: UnitId, name: impl Into<String>) -> Self {
        Unit { id, name: name.into() }
    }
}

/// One long-format panel cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub unit: UnitId,
    pub year: Year,
    pub variable: String,
    pub value: f64,
}

impl Observation {
    pub fn new(unit: UnitId, year: Year, variable: impl Into<String>, value: f64) -> Self {
        Observation { unit, year, variable: variable.into(), value }
    }
}

/// PanelData — immutable `(unit, year, variable) → value` table.
///
/// Purpose
/// -------
/// Hold the observations used by the optimizer, evaluator, and placebo
/// engine, and answer point lookups and completeness queries over them.
///
/// Fields
/// ------
/// - `units`: registry keyed by id, ordered for deterministic iteration.
/// - `variables`: interned variable names in first-seen order.
/// - `var_index`: name → interned index.
/// - `values`: `(unit, year, variable index) → value`.
/// - `dependent`: name of the outcome variable.
///
/// Invariants
/// ----------
/// - No duplicate keys; all values finite; `dependent` is interned.
///
/// Performance
/// -----------
/// - Construction is O(n) in the number of observations; point lookups are
///   O(1) on average.
#[derive(Debug, Clone)]
pub struct PanelData {
    units: BTreeMap<UnitId, Unit>,
    variables: Vec<String>,
    var_index: HashMap<String, usize>,
    values: HashMap<(UnitId, Year, usize), f64>,
    dependent: String,
}

impl PanelData {
    /// Construct a validated panel.
    ///
    /// Parameters
    /// ----------
    /// - `units`: every unit that may appear in the observations.
    /// - `observations`: long-format cells; order is irrelevant.
    /// - `dependent`: name of the outcome variable.
    ///
    /// Errors
    /// ------
    /// - [`PanelError::DuplicateUnit`] if two units share an id.
    /// - [`PanelError::UnknownUnit`] if an observation references an
    ///   unregistered unit.
    /// - [`PanelError::NonFiniteValue`] if a value is NaN or ±∞.
    /// - [`PanelError::DuplicateObservation`] if a key appears twice.
    /// - [`PanelError::UnknownDependent`] if `dependent` never occurs.
    pub fn new(
        units: Vec<Unit>, observations: Vec<Observation>, dependent: &str,
    ) -> PanelResult<Self> {
        let mut registry = BTreeMap::new();
        for unit in units {
            if registry.contains_key(&unit.id) {
                return Err(PanelError::DuplicateUnit { unit: unit.id });
            }
            registry.insert(unit.id, unit);
        }

        let mut variables: Vec<String> = Vec::new();
        let mut var_index: HashMap<String, usize> = HashMap::new();
        let mut values = HashMap::with_capacity(observations.len());
        for obs in observations {
            if !registry.contains_key(&obs.unit) {
                return Err(PanelError::UnknownUnit { unit: obs.unit });
            }
            if !obs.value.is_finite() {
                return Err(PanelError::NonFiniteValue {
                    unit: obs.unit,
                    year: obs.year,
                    variable: obs.variable,
                    value: obs.value,
                });
            }
            let idx = match var_index.get(&obs.variable) {
                Some(&idx) => idx,
                None => {
                    let idx = variables.len();
                    variables.push(obs.variable.clone());
                    var_index.insert(obs.variable.clone(), idx);
                    idx
                }
            };
            if values.insert((obs.unit, obs.year, idx), obs.value).is_some() {
                return Err(PanelError::DuplicateObservation {
                    unit: obs.unit,
                    year: obs.year,
                    variable: obs.variable,
                });
            }
        }

        if !var_index.contains_key(dependent) {
            return Err(PanelError::UnknownDependent { variable: dependent.to_string() });
        }

        Ok(PanelData { units: registry, variables, var_index, values, dependent: dependent.into() })
    }

    /// Name of the outcome variable.
    pub fn dependent(&self) -> &str {
        &self.dependent
    }

    /// Registered unit by id.
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// All registered units in ascending id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn contains_unit(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// Variable names in first-seen order (dependent included).
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn contains_variable(&self, variable: &str) -> bool {
        self.var_index.contains_key(variable)
    }

    /// Number of stored observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Distinct years present anywhere in the panel, ascending.
    pub fn years(&self) -> BTreeSet<Year> {
        self.values.keys().map(|&(_, year, _)| year).collect()
    }

    /// Point lookup that returns `None` for absent cells or unknown names.
    pub fn get(&self, unit: UnitId, year: Year, variable: &str) -> Option<f64> {
        let idx = *self.var_index.get(variable)?;
        self.values.get(&(unit, year, idx)).copied()
    }

    /// Point lookup that fails loudly.
    ///
    /// Errors
    /// ------
    /// - [`PanelError::UnknownVariable`] if `variable` is not in the panel.
    /// - [`PanelError::MissingData`] if the cell is absent.
    pub fn value(&self, unit: UnitId, year: Year, variable: &str) -> PanelResult<f64> {
        let idx = self.variable_index(variable)?;
        self.values.get(&(unit, year, idx)).copied().ok_or_else(|| PanelError::MissingData {
            unit,
            year,
            variable: variable.to_string(),
        })
    }

    /// Outcome (dependent variable) lookup.
    pub fn outcome(&self, unit: UnitId, year: Year) -> PanelResult<f64> {
        self.value(unit, year, &self.dependent)
    }

    /// Check that every `(unit, year, variable)` of the cross product exists.
    ///
    /// Units are scanned in the given order, then years ascending, then
    /// variables in the given order; the first gap is reported.
    ///
    /// Errors
    /// ------
    /// - [`PanelError::UnknownUnit`] for unregistered units.
    /// - [`PanelError::UnknownVariable`] for unknown names.
    /// - [`PanelError::MissingData`] for the first absent cell.
    pub fn require_complete<S: AsRef<str>>(
        &self, units: &[UnitId], window: &YearWindow, variables: &[S],
    ) -> PanelResult<()> {
        let indices = variables
            .iter()
            .map(|v| self.variable_index(v.as_ref()))
            .collect::<PanelResult<Vec<_>>>()?;
        for &unit in units {
            if !self.contains_unit(unit) {
                return Err(PanelError::UnknownUnit { unit });
            }
            for &year in window.years() {
                for (name, &idx) in variables.iter().zip(&indices) {
                    if !self.values.contains_key(&(unit, year, idx)) {
                        return Err(PanelError::MissingData {
                            unit,
                            year,
                            variable: name.as_ref().to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Outcome values of `unit` over `window`, ascending by year.
    pub fn outcome_series(&self, unit: UnitId, window: &YearWindow) -> PanelResult<Array1<f64>> {
        window.years().iter().map(|&year| self.outcome(unit, year)).collect()
    }

    /// Mean of `variable` for `unit` over every year of `window`.
    ///
    /// Errors
    /// ------
    /// - [`PanelError::MissingData`] if any year is absent.
    pub fn window_mean(&self, unit: UnitId, variable: &str, window: &YearWindow) -> PanelResult<f64> {
        let mut sum = 0.0;
        for &year in window.years() {
            sum += self.value(unit, year, variable)?;
        }
        Ok(sum / window.len() as f64)
    }

    fn variable_index(&self, variable: &str) -> PanelResult<usize> {
        self.var_index
            .get(variable)
            .copied()
            .ok_or_else(|| PanelError::UnknownVariable { variable: variable.to_string() })
    }
}
