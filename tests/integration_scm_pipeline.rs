//! Integration tests for the synthetic-control pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path from a long-format panel through weight
//!   fitting, predictor search, counterfactual evaluation, and placebo
//!   inference.
//! - Check the observable guarantees a report relies on: simplex weights,
//!   reproducibility under a fixed seed, explicit missing-data failures, and
//!   a complete, self-consistent placebo ranking.
//!
//! Coverage
//! --------
//! - `panel`: `PanelData`, `StudyDesign`, `StudyWindows` construction.
//! - `scm::fit`: exact-twin recovery, single-donor shortcut, simplex
//!   membership for both outer methods.
//! - `scm::search`: seed-89 determinism, two-candidate single-trial search.
//! - `scm::evaluate`: idempotence and the effect identity.
//! - `scm::placebo`: completeness and ratio reproducibility.
//! - `scm::study`: the full pipeline and its completeness flag.
//!
//! Exclusions
//! ----------
//! - QP, projection, and option-parsing details; these have unit tests.
//! - Python bindings.
use approx::{assert_abs_diff_eq, assert_relative_eq};
use ndarray::Array1;
use rust_scm::{
    optimization::criterion_optimizer::{LineSearcher, OuterMethod},
    panel::{Observation, PanelData, StudyDesign, StudyWindows, Unit, UnitId, YearWindow},
    scm::{
        DegenerateFitPolicy, InitialV, PlaceboOptions, SCMError, SCMOptions, SearchOptions,
        SyntheticControlStudy, evaluate, fit, run_placebo, search_seeded,
    },
};

const CANDIDATES: [&str; 5] = ["trade", "invest", "pop", "school", "industry"];

/// Purpose
/// -------
/// Study timeline: predictors and fit over 2013–2020, plot 2013–2023,
/// treatment in 2021.
fn windows() -> StudyWindows {
    StudyWindows::new(
        YearWindow::range(2013, 2020).unwrap(),
        YearWindow::range(2013, 2020).unwrap(),
        YearWindow::range(2013, 2023).unwrap(),
        2021,
    )
    .unwrap()
}

fn regional_row(unit: UnitId, t: f64) -> [f64; 6] {
    let u = f64::from(unit);
    [
        70.0 + 6.0 * u + (0.8 + 0.3 * u) * t + 2.0 * (0.7 * t + u).sin(),
        15.0 + 2.5 * u + 0.4 * t + (t * 0.5 + 2.0 * u).cos(),
        8.0 + 0.6 * u * u + 0.3 * (t - u).sin(),
        1.0 + 0.9 * u + 0.04 * t * u,
        40.0 - 1.5 * u + 0.2 * t + 0.5 * (1.3 * t * u).cos(),
        12.0 + 3.0 * (u * 0.9).sin() + 0.1 * t,
    ]
}

fn push(obs: &mut Vec<Observation>, unit: UnitId, year: i32, row: [f64; 6]) {
    obs.push(Observation::new(unit, year, "gdp", row[0]));
    for (name, value) in CANDIDATES.iter().zip(&row[1..]) {
        obs.push(Observation::new(unit, year, *name, *value));
    }
}

/// Purpose
/// -------
/// Six regions over 2013–2023 with smooth, unit-specific dynamics. Region 1
/// loses 12 units of gdp from 2021 on. When `skip` is set, that single
/// `(unit, year, variable)` cell is left out.
fn regional_panel(skip: Option<(UnitId, i32, &str)>) -> PanelData {
    let units = (1..=6).map(|i| Unit::new(i, format!("Region {i}"))).collect();
    let mut obs = Vec::new();
    for unit in 1..=6 {
        for year in 2013..=2023 {
            let mut row = regional_row(unit, f64::from(year - 2013));
            if unit == 1 && year >= 2021 {
                row[0] -= 12.0;
            }
            push(&mut obs, unit, year, row);
        }
    }
    if let Some((unit, year, variable)) = skip {
        obs.retain(|o| !(o.unit == unit && o.year == year && o.variable == variable));
    }
    PanelData::new(units, obs, "gdp").unwrap()
}

fn regional_design(panel: &PanelData) -> StudyDesign {
    StudyDesign::new(panel, 1, vec![2, 3, 4, 5, 6]).unwrap()
}

/// Purpose
/// -------
/// Three donors (11, 12, 13) and treated unit 10, which equals donor 11 in
/// every variable before 2021 and drops by 10 afterwards.
fn twin_panel() -> PanelData {
    let units = [10, 11, 12, 13].into_iter().map(|i| Unit::new(i, format!("Unit {i}"))).collect();
    let mut obs = Vec::new();
    for year in 2013..=2023 {
        let t = f64::from(year - 2013);
        for unit in [11, 12, 13] {
            push(&mut obs, unit, year, regional_row(unit - 10, t));
        }
        let mut treated = regional_row(1, t);
        if year >= 2021 {
            treated[0] -= 10.0;
        }
        push(&mut obs, 10, year, treated);
    }
    PanelData::new(units, obs, "gdp").unwrap()
}

fn assert_on_simplex(x: &Array1<f64>) {
    assert_abs_diff_eq!(x.sum(), 1.0, epsilon = 1e-6);
    assert!(x.iter().all(|&xi| xi >= -1e-9), "negative weight in {x}");
}

#[test]
// Purpose
// -------
// Verify the three-donor twin case: the synthetic unit is the twin donor.
//
// Given
// -----
// - Treated 10 identical to donor 11 over 2013–2020; donors [11, 12, 13].
//
// Expect
// ------
// - w ≈ (1, 0, 0), pre-RMSE ≈ 0, effect ≈ −10 in every post year.
fn three_donor_twin_is_recovered() {
    let panel = twin_panel();
    let design = StudyDesign::new(&panel, 10, vec![11, 12, 13]).unwrap();
    let w = windows();

    let out =
        fit(&panel, &design, &CANDIDATES, &w.predictors_prior, &w.optimize_window, &SCMOptions::default())
            .unwrap();

    assert_abs_diff_eq!(out.solution.w()[0], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(out.solution.w()[1], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(out.solution.w()[2], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(out.pre_rmse, 0.0, epsilon = 1e-6);

    let series = evaluate(&panel, 10, &out.solution, &w.plot_window).unwrap();
    for (year, e) in series.years.iter().zip(series.effect.iter()) {
        if *year >= 2021 {
            assert_abs_diff_eq!(*e, -10.0, epsilon = 1e-3);
        }
    }
}

#[test]
// Purpose
// -------
// Ensure weights land on their simplices for both outer methods and every
// starting rule.
//
// Given
// -----
// - Regional panel, all five candidates.
//
// Expect
// ------
// - Σw ≈ 1, w ≥ −1e-9; same for v; pre_rmse² equals the reported MSE.
// - An L-BFGS failure, if any, is an `Optimization` error with context.
fn weights_are_on_the_simplex() {
    let panel = regional_panel(None);
    let design = regional_design(&panel);
    let w = windows();

    for method in [OuterMethod::NelderMead, OuterMethod::Lbfgs(LineSearcher::HagerZhang)] {
        for initial_v in [InitialV::Equal, InitialV::Best] {
            let mut opts = SCMOptions::default();
            opts.outer.method = method;
            opts.initial_v = initial_v;

            let result =
                fit(&panel, &design, &CANDIDATES, &w.predictors_prior, &w.optimize_window, &opts);
            let out = match (method, result) {
                (_, Ok(out)) => out,
                // A line search may stall on the kinked outer criterion; the
                // failure must still name the unit and predictors.
                (OuterMethod::Lbfgs(_), Err(SCMError::Optimization { unit, predictors, .. })) => {
                    assert_eq!(unit, 1);
                    assert_eq!(predictors.len(), CANDIDATES.len());
                    continue;
                }
                (_, Err(e)) => panic!("fit failed: {e}"),
            };

            assert_on_simplex(out.solution.w());
            assert_on_simplex(out.solution.v());
            assert_relative_eq!(out.pre_rmse.powi(2), out.loss_w, max_relative = 1e-9);
            assert_eq!(out.balance.len(), CANDIDATES.len());
        }
    }
}

#[test]
// Purpose
// -------
// Verify a one-donor pool gets the whole weight.
//
// Given
// -----
// - Treated 1 with donors [4].
//
// Expect
// ------
// - w = [1.0] exactly.
fn single_donor_gets_weight_one() {
    let panel = regional_panel(None);
    let design = StudyDesign::new(&panel, 1, vec![4]).unwrap();
    let w = windows();

    let out =
        fit(&panel, &design, &CANDIDATES, &w.predictors_prior, &w.optimize_window, &SCMOptions::default())
            .unwrap();

    assert_eq!(out.solution.w().to_vec(), vec![1.0]);
}

#[test]
// Purpose
// -------
// Ensure the predictor search is reproducible under seed 89.
//
// Given
// -----
// - Regional panel, five candidates, 8 trials, seed 89, run twice.
//
// Expect
// ------
// - Identical best predictors, RMSE, and trial subsets; best RMSE is the
//   minimum over trials with the earliest index on ties.
fn seed_89_search_is_deterministic() {
    let panel = regional_panel(None);
    let design = regional_design(&panel);
    let w = windows();
    let opts = SearchOptions::new(8, 4).unwrap();
    let run = || {
        search_seeded(
            &panel,
            &design,
            &CANDIDATES,
            &w.predictors_prior,
            &w.optimize_window,
            &opts,
            &SCMOptions::default(),
            89,
        )
        .unwrap()
    };

    let a = run();
    let b = run();

    assert_eq!(a.best_predictors, b.best_predictors);
    assert_eq!(a.best_rmse, b.best_rmse);
    let subsets = |o: &rust_scm::scm::SearchOutcome| {
        o.trials.iter().map(|t| t.predictors.clone()).collect::<Vec<_>>()
    };
    assert_eq!(subsets(&a), subsets(&b));

    let first_min = a
        .trials
        .iter()
        .filter_map(|t| t.rmse().map(|r| (t.index, r)))
        .fold(None, |acc: Option<(usize, f64)>, (i, r)| match acc {
            Some((_, best)) if best <= r => acc,
            _ => Some((i, r)),
        })
        .unwrap();
    assert_eq!(first_min, (a.best_index, a.best_rmse));
    for trial in &a.trials {
        assert!((4..=5).contains(&trial.predictors.len()));
    }
}

#[test]
// Purpose
// -------
// Verify a two-predictor pool with a single trial returns that pool.
//
// Given
// -----
// - Candidates (invest, school), iterations = 1.
//
// Expect
// ------
// - best_predictors == ["invest", "school"] and one trial recorded.
fn two_predictor_pool_single_trial() {
    let panel = regional_panel(None);
    let w = windows();

    let out = search_seeded(
        &panel,
        &regional_design(&panel),
        &["invest", "school"],
        &w.predictors_prior,
        &w.optimize_window,
        &SearchOptions::new(1, 4).unwrap(),
        &SCMOptions::default(),
        89,
    )
    .unwrap();

    assert_eq!(out.best_predictors, vec!["invest".to_string(), "school".to_string()]);
    assert_eq!(out.trials.len(), 1);
}

#[test]
// Purpose
// -------
// Ensure the evaluator is pure.
//
// Given
// -----
// - A fitted solution on the regional panel, evaluated twice.
//
// Expect
// ------
// - Equal series; effect = actual − synthetic; synthetic = Σ w_d y_d.
fn evaluator_is_idempotent() {
    let panel = regional_panel(None);
    let w = windows();
    let out = fit(
        &panel,
        &regional_design(&panel),
        &CANDIDATES,
        &w.predictors_prior,
        &w.optimize_window,
        &SCMOptions::default(),
    )
    .unwrap();

    let a = evaluate(&panel, 1, &out.solution, &w.plot_window).unwrap();
    let b = evaluate(&panel, 1, &out.solution, &w.plot_window).unwrap();

    assert_eq!(a, b);
    for (t, &year) in a.years.iter().enumerate() {
        let synth: f64 = out
            .solution
            .donors()
            .iter()
            .zip(out.solution.w().iter())
            .map(|(&d, &wd)| wd * panel.outcome(d, year).unwrap())
            .sum();
        assert_relative_eq!(a.synthetic[t], synth, max_relative = 1e-12);
        assert_abs_diff_eq!(a.effect[t], a.actual[t] - a.synthetic[t], epsilon = 1e-12);
    }
}

#[test]
// Purpose
// -------
// Verify placebo completeness and ratio reproducibility.
//
// Given
// -----
// - Regional panel, six units, predictors (trade, pop, industry).
//
// Expect
// ------
// - ranked + excluded = 6; every ratio equals Post/Pre recomputed from its
//   effect series; p = rank / N_ranked.
fn placebo_ranking_is_complete_and_reproducible() {
    let panel = regional_panel(None);
    let w = windows();
    let predictors = ["trade", "pop", "industry"];

    let out = run_placebo(
        &panel,
        &regional_design(&panel),
        &predictors,
        &w,
        &SCMOptions::default(),
        &PlaceboOptions::default(),
    )
    .unwrap();

    assert_eq!(out.ranking.len() + out.excluded.len(), 6);
    let mut seen: Vec<UnitId> = out.ranking.iter().map(|e| e.unit).collect();
    seen.extend(out.excluded.iter().map(|x| x.unit));
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);

    for entry in &out.ranking {
        let (pre, post) = entry.series.mspe_split(w.treatment_year).unwrap();
        assert_relative_eq!(entry.pre_mspe, pre, max_relative = 1e-12);
        assert_relative_eq!(entry.ratio, post / pre, max_relative = 1e-12);
        assert_on_simplex(entry.solution.w());
    }
    assert_relative_eq!(
        out.p_value,
        out.treated_rank as f64 / out.ranking.len() as f64,
        epsilon = 1e-15
    );
}

#[test]
// Purpose
// -------
// Ensure absent observations fail loudly with their coordinates.
//
// Given
// -----
// - Regional panel without (unit 3, 2016, invest); then without
//   (unit 5, 2022, gdp).
//
// Expect
// ------
// - A fit using invest fails with `MissingData { 3, 2016, "invest" }`; one
//   without invest succeeds.
// - Placebo inference fails with `MissingData { 5, 2022, "gdp" }`.
fn missing_data_is_reported() {
    let w = windows();

    let panel = regional_panel(Some((3, 2016, "invest")));
    let design = regional_design(&panel);
    let err = fit(
        &panel,
        &design,
        &["trade", "invest"],
        &w.predictors_prior,
        &w.optimize_window,
        &SCMOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err, SCMError::MissingData { unit: 3, year: 2016, variable: "invest".into() });
    assert!(fit(
        &panel,
        &design,
        &["trade", "pop"],
        &w.predictors_prior,
        &w.optimize_window,
        &SCMOptions::default()
    )
    .is_ok());

    let panel = regional_panel(Some((5, 2022, "gdp")));
    let err = run_placebo(
        &panel,
        &regional_design(&panel),
        &["trade", "pop"],
        &w,
        &SCMOptions::default(),
        &PlaceboOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err, SCMError::MissingData { unit: 5, year: 2022, variable: "gdp".into() });
}

#[test]
// Purpose
// -------
// Exercise the full study pipeline and its completeness flag.
//
// Given
// -----
// - Regional panel, 6 trials, seed 89; once with default placebo options and
//   once with a very tight pre-fit cutoff (k = 1e-9).
//
// Expect
// ------
// - Reproducible reports; negative ATT; the tight cutoff excludes placebos
//   and marks the report incomplete with one reason per exclusion.
fn study_pipeline_reports_completeness() {
    let panel = regional_panel(None);
    let names: Vec<String> = CANDIDATES.iter().map(|s| s.to_string()).collect();
    let study = SyntheticControlStudy::new(&panel, regional_design(&panel), windows(), names)
        .with_search_options(SearchOptions::new(6, 3).unwrap());

    let report = study.run_seeded(89).unwrap();
    let again = study.run_seeded(89).unwrap();
    assert_eq!(report, again);
    assert!(report.att.mean < 0.0);
    assert_eq!(report.effects.years.len(), 11);
    assert_eq!(report.fit.solution.predictors(), report.search.best_predictors.as_slice());

    let strict = study.clone().with_placebo_options(
        PlaceboOptions::new(DegenerateFitPolicy::Infinite, Some(1e-9)).unwrap(),
    );
    let report = strict.run_seeded(89).unwrap();
    let excluded = report.placebo.excluded.len();
    assert!(excluded > 0);
    assert!(!report.completeness.is_complete());
    match &report.completeness {
        rust_scm::scm::Completeness::Incomplete { reasons } => assert_eq!(reasons.len(), excluded),
        other => panic!("unexpected completeness: {other:?}"),
    }
    assert!(report.placebo.treated_entry().is_some());
}
