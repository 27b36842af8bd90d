//! Synthetic panels shared by the `scm` unit tests.
//!
//! - [`twin_panel`]: treated unit 1 copies donor 2 exactly before 2021 and
//!   drops by 10 afterwards; donors 3 and 4 differ in every predictor.
//! - [`wiggle_panel`]: five units on distinct trends with unit-specific
//!   wiggles, so no unit is reproduced exactly by the others.
//! - [`mixed_scale_panel`]: twenty units with predictors spanning five
//!   orders of magnitude, for fits without standardization.
use crate::panel::{
    Observation, PanelData, StudyDesign, StudyWindows, Unit, UnitId, Year, YearWindow,
};

pub const PREDICTORS: [&str; 3] = ["trade", "invest", "pop"];

pub fn windows() -> StudyWindows {
    StudyWindows::new(
        YearWindow::range(2013, 2020).unwrap(),
        YearWindow::range(2013, 2020).unwrap(),
        YearWindow::range(2013, 2023).unwrap(),
        2021,
    )
    .unwrap()
}

fn donor_row(unit: UnitId, t: f64) -> [f64; 4] {
    match unit {
        2 => [100.0 + 2.0 * t, 30.0 + 0.5 * t, 20.0, 5.0 + 0.1 * t],
        3 => [80.0 + 3.0 * t, 45.0, 10.0 + t, 8.0],
        _ => [120.0 + t, 25.0, 35.0, 3.0 + 0.2 * t],
    }
}

fn push_row(obs: &mut Vec<Observation>, unit: UnitId, year: Year, row: [f64; 4]) {
    obs.push(Observation::new(unit, year, "gdp", row[0]));
    for (name, value) in PREDICTORS.iter().zip(&row[1..]) {
        obs.push(Observation::new(unit, year, *name, *value));
    }
}

pub fn twin_panel() -> PanelData {
    let units = (1..=4).map(|i| Unit::new(i, format!("Unit {i}"))).collect();
    let mut obs = Vec::new();
    for year in 2013..=2023 {
        let t = f64::from(year - 2013);
        for unit in 2..=4 {
            push_row(&mut obs, unit, year, donor_row(unit, t));
        }
        let mut treated = donor_row(2, t);
        if year >= 2021 {
            treated[0] -= 10.0;
        }
        push_row(&mut obs, 1, year, treated);
    }
    PanelData::new(units, obs, "gdp").unwrap()
}

pub fn twin_design(panel: &PanelData) -> StudyDesign {
    StudyDesign::new(panel, 1, vec![2, 3, 4]).unwrap()
}

pub fn wiggle_panel() -> PanelData {
    let units = (1..=5).map(|i| Unit::new(i, format!("Region {i}"))).collect();
    let mut obs = Vec::new();
    for unit in 1..=5u32 {
        let u = f64::from(unit);
        for year in 2013..=2023 {
            let t = f64::from(year - 2013);
            let mut gdp = 90.0 + 5.0 * u + (1.0 + 0.4 * u) * t + 1.5 * (t * u).sin();
            if unit == 1 && year >= 2021 {
                gdp -= 15.0;
            }
            let row = [
                gdp,
                20.0 + 3.0 * u + 0.3 * t + (t + u).cos(),
                10.0 + u * u * 0.5 + 0.2 * (2.0 * t - u).sin(),
                2.0 + 0.7 * u + 0.05 * t * u,
            ];
            push_row(&mut obs, unit, year, row);
        }
    }
    PanelData::new(units, obs, "gdp").unwrap()
}

pub fn wiggle_design(panel: &PanelData) -> StudyDesign {
    StudyDesign::new(panel, 1, vec![2, 3, 4, 5]).unwrap()
}

pub const MIXED_PREDICTORS: [&str; 6] = ["p0", "p1", "p2", "p3", "p4", "p5"];

/// Twenty units whose predictors `p0 … p5` live on scales `1e-2 … 1e3`.
pub fn mixed_scale_panel() -> PanelData {
    let units = (1..=20).map(|i| Unit::new(i, format!("Area {i}"))).collect();
    let mut obs = Vec::new();
    for unit in 1..=20u32 {
        let u = f64::from(unit);
        for year in 2013..=2023 {
            let t = f64::from(year - 2013);
            obs.push(Observation::new(unit, year, "gdp", 100.0 + 3.0 * u + t + 2.0 * (u * t).sin()));
            for (m, name) in MIXED_PREDICTORS.iter().enumerate() {
                let scale = 10f64.powi(m as i32 - 2);
                let value = scale * (1.0 + 0.5 * (0.7 * u * (m + 1) as f64 + 0.1 * t).sin());
                obs.push(Observation::new(unit, year, *name, value));
            }
        }
    }
    PanelData::new(units, obs, "gdp").unwrap()
}

pub fn mixed_scale_design(panel: &PanelData) -> StudyDesign {
    StudyDesign::new(panel, 1, (2..=20).collect()).unwrap()
}
