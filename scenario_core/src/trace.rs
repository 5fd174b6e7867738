//! Noise-free diagnostic path.
//!
//! Latent parameters sit at their prior means and every shock is
//! suppressed, so the trace isolates the mechanics that separate one
//! fusion year from another.

use serde::Serialize;

use crate::dynamics::{EvolvingPath, PathDynamics, SuppressedShocks};
use crate::scenario_config::{FusionTiming, SimulationConfig};
use crate::simulator::SimulationError;
use crate::state::LatentDraws;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraceRow {
    pub year: i32,
    pub temperature: f64,
    pub eroi: f64,
    pub gdp: f64,
    pub stability: f64,
    pub survival_tax: f64,
    pub damages: f64,
    pub investment: f64,
    pub maintenance: f64,
    pub growth_dampener: f64,
    /// EROI relative to the reference EROI that scales investment.
    pub eroi_ratio: f64,
}

pub fn trace_path(config: &SimulationConfig, fusion_year: i32) -> Result<Vec<TraceRow>, SimulationError> {
    let config = config.with_fixed_fusion(fusion_year);
    config.validate()?;
    let params = &config.model;
    let latent = LatentDraws::at_means(&params.priors, fusion_year as f64);
    let dynamics = PathDynamics::new(params, config.start_year, &config.fusion);
    let mut path = EvolvingPath::new(params, config.start_year, latent);
    let mut shocks = SuppressedShocks;

    let mut rows = Vec::with_capacity(config.year_count());
    for year in config.years() {
        let flows = if path.collapsed {
            path.state.year = year;
            Default::default()
        } else {
            dynamics.step(&mut path, year, &mut shocks)
        };
        let s = path.state;
        rows.push(TraceRow {
            year,
            temperature: s.temperature,
            eroi: s.eroi,
            gdp: s.gdp,
            stability: s.stability,
            survival_tax: s.survival_tax,
            damages: flows.damages,
            investment: flows.investment,
            maintenance: flows.maintenance,
            growth_dampener: flows.growth_dampener,
            eroi_ratio: s.eroi / params.climate.reference_eroi,
        });
    }
    tracing::debug!(
        target: "fusion_scenario::trace",
        fusion = %FusionTiming::Fixed { year: fusion_year }.label(),
        terminal_gdp = rows.last().map(|row| row.gdp),
        "trace.completed"
    );
    Ok(rows)
}
