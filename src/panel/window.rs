//! Year windows and the study timeline.
//!
//! Purpose
//! -------
//! Describe the three year ranges a synthetic-control study uses and the
//! treatment year that splits the plotting horizon into pre- and
//! post-treatment periods.
//!
//! Key behaviors
//! -------------
//! - [`YearWindow`] stores a non-empty, strictly ascending set of years.
//! - [`StudyWindows::new`] validates the relationships between windows:
//!   `optimize_window ⊆ plot_window`, every optimize year precedes the
//!   treatment year, and the treatment year leaves both sides of the plot
//!   window non-empty.
//!
//! Conventions
//! -----------
//! - Pre-treatment means `year < treatment_year`; post-treatment means
//!   `year ≥ treatment_year`.
//! - `predictors_prior` is independent of the other windows; it only needs
//!   predictor data, not outcome data.
use crate::panel::{
    data::Year,
    errors::{PanelError, PanelResult},
};

/// YearWindow — non-empty, strictly ascending list of years.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearWindow {
    years: Vec<Year>,
}

impl YearWindow {
    /// Inclusive year range `start..=end`.
    ///
    /// Errors
    /// ------
    /// - [`PanelError::EmptyWindow`] if `start > end`.
    pub fn range(start: Year, end: Year) -> PanelResult<Self> {
        if start > end {
            return Err(PanelError::EmptyWindow { window: "range" });
        }
        Ok(YearWindow { years: (start..=end).collect() })
    }

    /// Arbitrary set of years; duplicates are collapsed and order is
    /// normalized to ascending.
    ///
    /// Errors
    /// ------
    /// - [`PanelError::EmptyWindow`] if `years` is empty.
    pub fn from_years(mut years: Vec<Year>) -> PanelResult<Self> {
        if years.is_empty() {
            return Err(PanelError::EmptyWindow { window: "years" });
        }
        years.sort_unstable();
        years.dedup();
        Ok(YearWindow { years })
    }

    pub fn years(&self) -> &[Year] {
        &self.years
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// Windows are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn first(&self) -> Year {
        self.years[0]
    }

    pub fn last(&self) -> Year {
        self.years[self.years.len() - 1]
    }

    pub fn contains(&self, year: Year) -> bool {
        self.years.binary_search(&year).is_ok()
    }

    /// Number of years strictly before `year`.
    pub fn count_before(&self, year: Year) -> usize {
        self.years.partition_point(|&y| y < year)
    }
}

/// StudyWindows — validated timeline of a synthetic-control study.
///
/// Fields
/// ------
/// - `predictors_prior`: years averaged to build predictor vectors.
/// - `optimize_window`: pre-treatment years over which the outcome fit is
///   minimized.
/// - `plot_window`: full horizon evaluated by the counterfactual evaluator.
/// - `treatment_year`: first post-treatment year.
///
/// Invariants
/// ----------
/// - `optimize_window ⊆ plot_window`.
/// - `max(optimize_window) < treatment_year`.
/// - `plot_window` has at least one year on each side of `treatment_year`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyWindows {
    pub predictors_prior: YearWindow,
    pub optimize_window: YearWindow,
    pub plot_window: YearWindow,
    pub treatment_year: Year,
}

impl StudyWindows {
    /// Validate and bundle the study timeline.
    ///
    /// Errors
    /// ------
    /// - [`PanelError::WindowNotContained`] if an optimize year is outside
    ///   the plot window.
    /// - [`PanelError::OptimizeAfterTreatment`] if an optimize year is not
    ///   strictly before `treatment_year`.
    /// - [`PanelError::TreatmentYearOutOfRange`] if the pre- or post-period of
    ///   the plot window would be empty.
    pub fn new(
        predictors_prior: YearWindow, optimize_window: YearWindow, plot_window: YearWindow,
        treatment_year: Year,
    ) -> PanelResult<Self> {
        for &year in optimize_window.years() {
            if !plot_window.contains(year) {
                return Err(PanelError::WindowNotContained { window: "optimize_window", year });
            }
            if year >= treatment_year {
                return Err(PanelError::OptimizeAfterTreatment { year, treatment_year });
            }
        }
        if plot_window.first() >= treatment_year {
            return Err(PanelError::TreatmentYearOutOfRange {
                treatment_year,
                reason: "plot window has no pre-treatment years",
            });
        }
        if plot_window.last() < treatment_year {
            return Err(PanelError::TreatmentYearOutOfRange {
                treatment_year,
                reason: "plot window has no post-treatment years",
            });
        }
        Ok(StudyWindows { predictors_prior, optimize_window, plot_window, treatment_year })
    }

    /// Number of pre-treatment years in the plot window.
    pub fn n_pre(&self) -> usize {
        self.plot_window.count_before(self.treatment_year)
    }

    /// Number of post-treatment years in the plot window.
    pub fn n_post(&self) -> usize {
        self.plot_window.len() - self.n_pre()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `YearWindow` constructors and ordering helpers.
    // - Every validation branch of `StudyWindows::new`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify `from_years` normalizes order and removes duplicates, and that
    // `count_before` splits correctly.
    //
    // Given
    // -----
    // - years = [2003, 2001, 2002, 2001].
    //
    // Expect
    // ------
    // - years() == [2001, 2002, 2003]; count_before(2002) == 1.
    fn from_years_normalizes() {
        let w = YearWindow::from_years(vec![2003, 2001, 2002, 2001]).unwrap();

        assert_eq!(w.years(), &[2001, 2002, 2003]);
        assert_eq!(w.count_before(2002), 1);
        assert!(w.contains(2003));
        assert!(!w.contains(2004));
    }

    #[test]
    // Purpose
    // -------
    // Ensure empty windows are rejected.
    //
    // Given
    // -----
    // - `range(2005, 2004)` and `from_years(vec![])`.
    //
    // Expect
    // ------
    // - Both return `EmptyWindow`.
    fn empty_windows_are_rejected() {
        assert!(matches!(YearWindow::range(2005, 2004), Err(PanelError::EmptyWindow { .. })));
        assert!(matches!(YearWindow::from_years(vec![]), Err(PanelError::EmptyWindow { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Verify a valid timeline and its pre/post counts.
    //
    // Given
    // -----
    // - plot 2013..=2023, optimize 2013..=2020, treatment 2021.
    //
    // Expect
    // ------
    // - n_pre == 8, n_post == 3.
    fn study_windows_accepts_valid_timeline() {
        let windows = StudyWindows::new(
            YearWindow::range(2013, 2020).unwrap(),
            YearWindow::range(2013, 2020).unwrap(),
            YearWindow::range(2013, 2023).unwrap(),
            2021,
        )
        .unwrap();

        assert_eq!(windows.n_pre(), 8);
        assert_eq!(windows.n_post(), 3);
    }

    #[test]
    // Purpose
    // -------
    // Ensure the containment and pre-treatment rules are enforced.
    //
    // Given
    // -----
    // - optimize window reaching outside the plot window, and one reaching
    //   the treatment year.
    //
    // Expect
    // ------
    // - `WindowNotContained` and `OptimizeAfterTreatment` respectively.
    fn study_windows_rejects_bad_optimize_window() {
        let outside = StudyWindows::new(
            YearWindow::range(2013, 2020).unwrap(),
            YearWindow::range(2010, 2020).unwrap(),
            YearWindow::range(2013, 2023).unwrap(),
            2021,
        );
        assert_eq!(
            outside.unwrap_err(),
            PanelError::WindowNotContained { window: "optimize_window", year: 2010 }
        );

        let late = StudyWindows::new(
            YearWindow::range(2013, 2020).unwrap(),
            YearWindow::range(2013, 2021).unwrap(),
            YearWindow::range(2013, 2023).unwrap(),
            2021,
        );
        assert_eq!(
            late.unwrap_err(),
            PanelError::OptimizeAfterTreatment { year: 2021, treatment_year: 2021 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Ensure a treatment year outside the plot window is rejected.
    //
    // Given
    // -----
    // - plot 2013..=2020 with treatment 2021 (no post years).
    //
    // Expect
    // ------
    // - `TreatmentYearOutOfRange`.
    fn study_windows_rejects_missing_post_period() {
        let err = StudyWindows::new(
            YearWindow::range(2013, 2015).unwrap(),
            YearWindow::range(2013, 2015).unwrap(),
            YearWindow::range(2013, 2020).unwrap(),
            2021,
        )
        .unwrap_err();

        assert!(matches!(err, PanelError::TreatmentYearOutOfRange { treatment_year: 2021, .. }));
    }
}
