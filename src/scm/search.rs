//! scm::search — randomized predictor-subset search.
//!
//! Purpose
//! -------
//! Explore subsets of the candidate predictors and keep the one whose fit
//! reproduces the treated unit's optimize-window outcome best.
//!
//! Key behaviors
//! -------------
//! - Every trial draws a size uniformly from `[min(min_subset_size, n), n]`
//!   and then a uniform subset of that size without replacement.
//! - All subsets are drawn from the caller's RNG before any fit runs, so
//!   the rayon-parallel evaluation cannot change which subsets are tried.
//! - The best trial minimizes the optimize-window RMSE; ties go to the
//!   lowest trial index.
//! - Failed trials are kept in the record with their error.
//!
//! Conventions
//! -----------
//! - Predictors inside a subset keep the candidate-list order.
use log::{debug, warn};
use rand::{Rng, SeedableRng, seq::index};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::panel::{PanelData, StudyDesign, YearWindow, validate_predictors};
use crate::scm::{
    errors::{SCMError, SCMResult},
    fit::{FitOutcome, fit},
    options::{SCMOptions, SearchOptions},
};

/// Record of one search trial.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTrial {
    pub index: usize,
    pub predictors: Vec<String>,
    pub outcome: SCMResult<FitOutcome>,
}

impl SearchTrial {
    pub fn rmse(&self) -> Option<f64> {
        self.outcome.as_ref().ok().map(|fit| fit.pre_rmse)
    }
}

/// Best subset together with every trial record, ordered by trial index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub best_index: usize,
    pub best_predictors: Vec<String>,
    pub best_fit: FitOutcome,
    pub best_rmse: f64,
    pub trials: Vec<SearchTrial>,
}

impl SearchOutcome {
    pub fn failed_trials(&self) -> impl Iterator<Item = (usize, &SCMError)> {
        self.trials.iter().filter_map(|t| t.outcome.as_ref().err().map(|e| (t.index, e)))
    }
}

/// Draw `iterations` predictor subsets from `candidates`.
pub fn draw_subsets<S: AsRef<str>, R: Rng + ?Sized>(
    candidates: &[S], iterations: usize, min_subset_size: usize, rng: &mut R,
) -> Vec<Vec<String>> {
    let n = candidates.len();
    if n == 0 {
        return Vec::new();
    }
    let lower = min_subset_size.clamp(1, n);
    (0..iterations)
        .map(|_| {
            let size = rng.gen_range(lower..=n);
            let mut picked = index::sample(rng, n, size).into_vec();
            picked.sort_unstable();
            picked.into_iter().map(|i| candidates[i].as_ref().to_string()).collect()
        })
        .collect()
}

/// Run the randomized search.
///
/// Errors
/// ------
/// - `SCMError::Panel` if the candidate list is empty, repeats a name,
///   names the outcome, or names an unknown variable.
/// - `SCMError::AllTrialsFailed` if no trial produced a fit.
#[allow(clippy::too_many_arguments)]
pub fn search<S: AsRef<str>, R: Rng + ?Sized>(
    panel: &PanelData, design: &StudyDesign, candidates: &[S], predictors_prior: &YearWindow,
    optimize_window: &YearWindow, search_opts: &SearchOptions, opts: &SCMOptions, rng: &mut R,
) -> SCMResult<SearchOutcome> {
    validate_predictors(panel, candidates)?;
    let subsets =
        draw_subsets(candidates, search_opts.iterations, search_opts.min_subset_size, rng);
    debug!(
        "search unit {}: {} trials over {} candidates",
        design.treated(),
        subsets.len(),
        candidates.len()
    );

    let trials: Vec<SearchTrial> = subsets
        .into_par_iter()
        .enumerate()
        .map(|(index, predictors)| {
            let outcome =
                fit(panel, design, predictors.as_slice(), predictors_prior, optimize_window, opts);
            if let Err(e) = &outcome {
                warn!("search trial {index} failed: {e}");
            }
            SearchTrial { index, predictors, outcome }
        })
        .collect();

    let mut best: Option<(usize, f64)> = None;
    for trial in &trials {
        if let Some(rmse) = trial.rmse() {
            if best.map_or(true, |(_, b)| rmse < b) {
                best = Some((trial.index, rmse));
            }
        }
    }

    let Some((best_index, best_rmse)) = best else {
        let first = trials.first().and_then(|t| t.outcome.as_ref().err().cloned());
        return Err(SCMError::AllTrialsFailed {
            trials: trials.len(),
            first_trial: 0,
            source: Box::new(first.unwrap_or(SCMError::InvalidOptions {
                option: "iterations",
                reason: "no trials were run".to_string(),
            })),
        });
    };

    let best_trial = &trials[best_index];
    let best_fit = best_trial.outcome.clone()?;
    debug!(
        "search unit {}: best trial {best_index} [{}] rmse {best_rmse:.6}",
        design.treated(),
        best_trial.predictors.join(", ")
    );
    Ok(SearchOutcome {
        best_index,
        best_predictors: best_trial.predictors.clone(),
        best_fit,
        best_rmse,
        trials,
    })
}

/// [`search`] driven by `ChaCha8Rng::seed_from_u64(seed)`.
#[allow(clippy::too_many_arguments)]
pub fn search_seeded<S: AsRef<str>>(
    panel: &PanelData, design: &StudyDesign, candidates: &[S], predictors_prior: &YearWindow,
    optimize_window: &YearWindow, search_opts: &SearchOptions, opts: &SCMOptions, seed: u64,
) -> SCMResult<SearchOutcome> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    search(panel, design, candidates, predictors_prior, optimize_window, search_opts, opts, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scm::fixtures::{PREDICTORS, wiggle_design, wiggle_panel, windows};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Subset draws: size bounds, uniqueness, candidate order.
    // - Seeded determinism and the minimum-RMSE selection.
    // - The single-trial, two-candidate case.
    // - The all-trials-failed error.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify every drawn subset respects the size bounds and order.
    //
    // Given
    // -----
    // - 6 candidates, 200 draws, min size 4, seed 7.
    //
    // Expect
    // ------
    // - 4 ≤ |subset| ≤ 6, strictly increasing candidate positions.
    fn subsets_respect_bounds_and_order() {
        let candidates = ["a", "b", "c", "d", "e", "f"];
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let subsets = draw_subsets(&candidates, 200, 4, &mut rng);

        assert_eq!(subsets.len(), 200);
        for s in &subsets {
            assert!((4..=6).contains(&s.len()));
            let pos: Vec<usize> =
                s.iter().map(|p| candidates.iter().position(|c| *c == p.as_str()).unwrap()).collect();
            assert!(pos.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure a seeded search is reproducible and keeps the minimum RMSE.
    //
    // Given
    // -----
    // - Wiggle panel, 3 candidates, 6 trials, min size 1, seed 89, run twice.
    //
    // Expect
    // ------
    // - Same best predictors and RMSE; best RMSE ≤ every successful trial.
    fn seeded_search_is_deterministic() {
        let panel = wiggle_panel();
        let design = wiggle_design(&panel);
        let w = windows();
        let search_opts = SearchOptions::new(6, 1).unwrap();
        let run = || {
            search_seeded(
                &panel,
                &design,
                &PREDICTORS,
                &w.predictors_prior,
                &w.optimize_window,
                &search_opts,
                &SCMOptions::default(),
                89,
            )
            .unwrap()
        };

        let a = run();
        let b = run();

        assert_eq!(a.best_predictors, b.best_predictors);
        assert_eq!(a.best_rmse, b.best_rmse);
        assert_eq!(a.trials.len(), 6);
        for trial in &a.trials {
            assert!(a.best_rmse <= trial.rmse().unwrap());
        }
        assert_eq!(a.failed_trials().count(), 0);
    }

    #[test]
    // Purpose
    // -------
    // Verify the two-candidate pool with one trial returns that pool.
    //
    // Given
    // -----
    // - Candidates (trade, pop), iterations = 1, default min size 4.
    //
    // Expect
    // ------
    // - best_predictors == ["trade", "pop"].
    fn two_candidates_one_trial() {
        let panel = wiggle_panel();
        let w = windows();

        let out = search_seeded(
            &panel,
            &wiggle_design(&panel),
            &["trade", "pop"],
            &w.predictors_prior,
            &w.optimize_window,
            &SearchOptions::new(1, 4).unwrap(),
            &SCMOptions::default(),
            1,
        )
        .unwrap();

        assert_eq!(out.best_predictors, vec!["trade".to_string(), "pop".to_string()]);
        assert_eq!(out.best_index, 0);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a search where every fit fails reports the first failure.
    //
    // Given
    // -----
    // - An optimize window starting in 2010, before any outcome exists.
    //
    // Expect
    // ------
    // - `AllTrialsFailed { trials: 3, first_trial: 0, source: MissingData }`.
    fn all_failed_trials_are_reported() {
        let panel = wiggle_panel();
        let w = windows();
        let early = YearWindow::range(2010, 2020).unwrap();

        let err = search_seeded(
            &panel,
            &wiggle_design(&panel),
            &PREDICTORS,
            &w.predictors_prior,
            &early,
            &SearchOptions::new(3, 2).unwrap(),
            &SCMOptions::default(),
            5,
        )
        .unwrap_err();

        match err {
            SCMError::AllTrialsFailed { trials, first_trial, source } => {
                assert_eq!((trials, first_trial), (3, 0));
                assert!(matches!(*source, SCMError::MissingData { year: 2010, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
