//! Causal sweep over fixed fusion years.
//!
//! Each point pins every path to the same fusion year while all other
//! latent parameters keep their prior draws. Because a path's generator
//! depends only on the seed and its index, points share those draws.

use serde::Serialize;

use crate::aggregate::{expected_value_of_delay, DelayCost, RunResult};
use crate::scenario_config::SimulationConfig;
use crate::simulator::{SimulationError, Simulator, StopSignal};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub fusion_year: i32,
    pub result: RunResult,
}

/// Finite-difference slope of mean terminal GDP with respect to the fusion
/// year, located at the midpoint of two adjacent sweep years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepGradient {
    pub midpoint: f64,
    pub gdp_per_year: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub points: Vec<SweepPoint>,
    pub gradients: Vec<SweepGradient>,
    pub delay_costs: Vec<DelayCost>,
}

impl SweepResult {
    pub fn point(&self, fusion_year: i32) -> Option<&SweepPoint> {
        self.points
            .iter()
            .find(|point| point.fusion_year == fusion_year)
    }
}

pub fn run_sweep(
    base: &SimulationConfig,
    years: &[i32],
    stop: Option<&StopSignal>,
) -> Result<SweepResult, SimulationError> {
    let mut years = years.to_vec();
    years.sort_unstable();
    years.dedup();

    let mut points = Vec::with_capacity(years.len());
    for year in years {
        let mut simulator = Simulator::new(base.with_fixed_fusion(year))?;
        if let Some(stop) = stop {
            simulator = simulator.with_stop_signal(stop.clone());
        }
        let result = simulator.run()?;
        tracing::debug!(
            target: "fusion_scenario::sweep",
            fusion_year = year,
            mean_terminal_gdp = result.terminal.mean,
            "sweep.point_completed"
        );
        points.push(SweepPoint {
            fusion_year: year,
            result,
        });
    }

    Ok(summarize(points))
}

pub fn summarize(points: Vec<SweepPoint>) -> SweepResult {
    let gradients = points
        .windows(2)
        .map(|pair| {
            let (early, late) = (&pair[0], &pair[1]);
            let span = (late.fusion_year - early.fusion_year) as f64;
            SweepGradient {
                midpoint: (early.fusion_year + late.fusion_year) as f64 / 2.0,
                gdp_per_year: (late.result.terminal.mean - early.result.terminal.mean) / span,
            }
        })
        .collect();
    let delay_costs = points
        .windows(2)
        .filter_map(|pair| expected_value_of_delay(&pair[0].result, &pair[1].result))
        .collect();
    SweepResult {
        points,
        gradients,
        delay_costs,
    }
}
