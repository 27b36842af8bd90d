//! scm::placebo — in-space placebo inference.
//!
//! Purpose
//! -------
//! Refit the synthetic control with every unit of the study universe in the
//! treated role and rank the units by `Post_MSPE / Pre_MSPE`. The treated
//! unit's position gives the permutation p-value `rank / N`.
//!
//! Key behaviors
//! -------------
//! - Completeness of predictors over `predictors_prior` and of the outcome
//!   over `plot_window` is checked for the whole universe up front.
//! - Per-unit fits run in parallel (rayon); results are processed in
//!   universe order (treated first, then donors as given).
//! - A failed fit of the treated unit is returned as an error. Failed
//!   placebo fits are excluded and recorded with their error.
//! - A numerically zero `Pre_MSPE` (at most [`DEGENERATE_MSPE`] times the
//!   mean squared pre-treatment outcome) follows [`DegenerateFitPolicy`].
//! - The optional pre-fit cutoff drops placebos with
//!   `Pre_MSPE > k × Pre_MSPE(treated)`; the treated unit is never dropped
//!   by it.
//!
//! Invariants & assumptions
//! ------------------------
//! - `ranking.len() + excluded.len() == N`.
//! - Ranking is descending by ratio; ties are ordered by ascending unit id.
//! - `treated_rank` counts the ranked units whose ratio is at least the
//!   treated ratio, so ties never flatter the treated unit.
use log::{debug, warn};
use ndarray::s;
use rayon::prelude::*;

use crate::panel::{PanelData, StudyDesign, StudyWindows, UnitId, validate_predictors};
use crate::scm::{
    errors::{SCMError, SCMResult},
    evaluate::{EffectSeries, evaluate},
    fit::{WeightSolution, fit},
    options::{DegenerateFitPolicy, PlaceboOptions, SCMOptions},
};

/// Relative size below which a pre-treatment MSPE counts as zero.
pub const DEGENERATE_MSPE: f64 = 1e-16;

/// One ranked unit.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceboEntry {
    pub unit: UnitId,
    pub is_treated: bool,
    pub pre_mspe: f64,
    pub post_mspe: f64,
    pub ratio: f64,
    /// 1-based position in the ranking.
    pub rank: usize,
    pub solution: WeightSolution,
    pub series: EffectSeries,
}

/// Why a unit is missing from the ranking.
#[derive(Debug, Clone, PartialEq)]
pub enum ExclusionReason {
    FitFailed(SCMError),
    DegenerateFit { pre_mspe: f64 },
    PoorPreFit { pre_mspe: f64, threshold: f64 },
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::FitFailed(err) => write!(f, "fit failed: {err}"),
            ExclusionReason::DegenerateFit { pre_mspe } => {
                write!(f, "pre-treatment MSPE is {pre_mspe}")
            }
            ExclusionReason::PoorPreFit { pre_mspe, threshold } => {
                write!(f, "pre-treatment MSPE {pre_mspe} exceeds cutoff {threshold}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedUnit {
    pub unit: UnitId,
    pub reason: ExclusionReason,
}

/// Placebo ranking and the treated unit's p-value.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceboOutcome {
    pub treated: UnitId,
    pub ranking: Vec<PlaceboEntry>,
    pub excluded: Vec<ExcludedUnit>,
    pub treated_rank: usize,
    pub p_value: f64,
}

impl PlaceboOutcome {
    pub fn treated_entry(&self) -> Option<&PlaceboEntry> {
        self.ranking.iter().find(|e| e.is_treated)
    }

    /// `true` when every unit of the universe was ranked.
    pub fn is_complete(&self) -> bool {
        self.excluded.is_empty()
    }
}

/// Fit and evaluation of one unit in the treated role.
#[derive(Debug, Clone, PartialEq)]
struct UnitRun {
    solution: WeightSolution,
    series: EffectSeries,
    pre_mspe: f64,
    post_mspe: f64,
    /// Mean squared actual outcome over the pre-treatment plot years.
    pre_scale: f64,
}

/// Run placebo inference over `design`'s universe.
///
/// Errors
/// ------
/// - `SCMError::MissingData` if any unit lacks a predictor over
///   `predictors_prior` or the outcome over `plot_window`.
/// - The treated unit's own fit error.
/// - `SCMError::DegenerateFit` under [`DegenerateFitPolicy::Fail`].
/// - `SCMError::TreatedNotRanked` if the treated unit is excluded.
pub fn run_placebo<S: AsRef<str> + Sync>(
    panel: &PanelData, design: &StudyDesign, predictors: &[S], windows: &StudyWindows,
    opts: &SCMOptions, placebo_opts: &PlaceboOptions,
) -> SCMResult<PlaceboOutcome> {
    validate_predictors(panel, predictors)?;
    let universe = design.universe();
    panel.require_complete(&universe, &windows.predictors_prior, predictors)?;
    panel.require_complete(&universe, &windows.plot_window, &[panel.dependent()])?;
    debug!("placebo: fitting {} units", universe.len());

    let runs: Vec<(UnitId, SCMResult<UnitRun>)> = universe
        .par_iter()
        .map(|&unit| (unit, run_unit(panel, design, unit, predictors, windows, opts)))
        .collect();

    rank_runs(design.treated(), runs, placebo_opts)
}

fn run_unit<S: AsRef<str>>(
    panel: &PanelData, design: &StudyDesign, unit: UnitId, predictors: &[S],
    windows: &StudyWindows, opts: &SCMOptions,
) -> SCMResult<UnitRun> {
    let placebo_design = design.placebo(unit)?;
    let fitted = fit(
        panel,
        &placebo_design,
        predictors,
        &windows.predictors_prior,
        &windows.optimize_window,
        opts,
    )?;
    let series = evaluate(panel, unit, &fitted.solution, &windows.plot_window)?;
    let (pre_mspe, post_mspe) = series.mspe_split(windows.treatment_year)?;
    let n_pre = windows.plot_window.count_before(windows.treatment_year);
    let pre_scale = series.actual.slice(s![..n_pre]).mapv(|a| a * a).mean().unwrap_or(0.0);
    Ok(UnitRun { solution: fitted.solution, series, pre_mspe, post_mspe, pre_scale })
}

fn rank_runs(
    treated: UnitId, runs: Vec<(UnitId, SCMResult<UnitRun>)>, opts: &PlaceboOptions,
) -> SCMResult<PlaceboOutcome> {
    let mut excluded = Vec::new();
    let mut exclude = |unit: UnitId, reason: ExclusionReason| {
        warn!("placebo: unit {unit} excluded ({reason})");
        excluded.push(ExcludedUnit { unit, reason });
    };

    let mut scored: Vec<(UnitId, UnitRun, f64)> = Vec::with_capacity(runs.len());
    for (unit, run) in runs {
        let run = match run {
            Ok(run) => run,
            Err(err) if unit == treated => return Err(err),
            Err(err) => {
                exclude(unit, ExclusionReason::FitFailed(err));
                continue;
            }
        };
        if run.pre_mspe <= DEGENERATE_MSPE * run.pre_scale {
            match opts.degenerate_policy {
                DegenerateFitPolicy::Fail => {
                    return Err(SCMError::DegenerateFit { unit, pre_mspe: run.pre_mspe });
                }
                DegenerateFitPolicy::Exclude if unit == treated => {
                    return Err(SCMError::TreatedNotRanked {
                        unit,
                        reason: "pre-treatment MSPE is zero".to_string(),
                    });
                }
                DegenerateFitPolicy::Exclude => {
                    exclude(unit, ExclusionReason::DegenerateFit { pre_mspe: run.pre_mspe });
                    continue;
                }
                DegenerateFitPolicy::Infinite => {
                    scored.push((unit, run, f64::INFINITY));
                    continue;
                }
            }
        }
        let ratio = run.post_mspe / run.pre_mspe;
        scored.push((unit, run, ratio));
    }

    let treated_pre = scored
        .iter()
        .find(|(u, _, _)| *u == treated)
        .map(|(_, run, _)| run.pre_mspe)
        .ok_or_else(|| SCMError::TreatedNotRanked {
            unit: treated,
            reason: "treated unit missing from placebo runs".to_string(),
        })?;

    if let Some(k) = opts.pre_mspe_cutoff {
        let threshold = k * treated_pre;
        scored.retain(|(unit, run, _)| {
            if *unit != treated && run.pre_mspe > threshold {
                exclude(*unit, ExclusionReason::PoorPreFit { pre_mspe: run.pre_mspe, threshold });
                false
            } else {
                true
            }
        });
    }

    scored.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)));
    let ranking: Vec<PlaceboEntry> = scored
        .into_iter()
        .enumerate()
        .map(|(i, (unit, run, ratio))| PlaceboEntry {
            unit,
            is_treated: unit == treated,
            pre_mspe: run.pre_mspe,
            post_mspe: run.post_mspe,
            ratio,
            rank: i + 1,
            solution: run.solution,
            series: run.series,
        })
        .collect();

    let treated_ratio = ranking
        .iter()
        .find(|e| e.is_treated)
        .map(|e| e.ratio)
        .unwrap_or(f64::NAN);
    let treated_rank = ranking.iter().filter(|e| e.ratio >= treated_ratio).count();
    let p_value = treated_rank as f64 / ranking.len() as f64;
    debug!(
        "placebo: treated unit {treated} rank {treated_rank}/{} (p = {p_value:.4}), {} excluded",
        ranking.len(),
        excluded.len()
    );

    Ok(PlaceboOutcome { treated, ranking, excluded, treated_rank, p_value })
}
