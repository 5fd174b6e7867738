use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;

use crate::aggregate::{aggregate, RunResult};
use crate::dynamics::{EvolvingPath, PathDynamics, SampledShocks};
use crate::hashing::path_rng;
use crate::scenario_config::{ConfigError, SimulationConfig};
use crate::state::{LatentDraws, PathState, Trajectory};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    #[error("simulation cancelled after {completed_paths} completed paths")]
    Cancelled { completed_paths: u64 },
}

/// Cooperative cancellation flag, checked between simulated years.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Generates independent trajectories for a validated configuration.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: Arc<SimulationConfig>,
    stop: StopSignal,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            stop: StopSignal::default(),
        })
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulate every path on the rayon pool. Output is ordered by path
    /// index and does not depend on the number of worker threads.
    pub fn simulate(&self) -> Result<Vec<Trajectory>, SimulationError> {
        let completed = AtomicU64::new(0);
        let trajectories = (0..self.config.paths as u64)
            .into_par_iter()
            .map(|index| {
                let trajectory = self.simulate_path(index);
                if trajectory.is_some() {
                    completed.fetch_add(1, Ordering::Relaxed);
                }
                trajectory
            })
            .collect::<Option<Vec<_>>>();
        trajectories.ok_or_else(|| SimulationError::Cancelled {
            completed_paths: completed.load(Ordering::Relaxed),
        })
    }

    /// Simulate a single path; `None` if the stop signal fired.
    pub fn simulate_path(&self, index: u64) -> Option<Trajectory> {
        let config = &*self.config;
        let params = &config.model;
        let mut rng = path_rng(config.seed, index);
        let beyond_horizon = config.fusion_horizon() as f64 + 1.0;
        let latent = LatentDraws::sample(&params.priors, &config.fusion, beyond_horizon, &mut rng);
        let dynamics = PathDynamics::new(params, config.start_year, &config.fusion);
        let mut path = EvolvingPath::new(params, config.start_year, latent);
        let mut shocks = SampledShocks::new(&mut rng);

        let mut states: Vec<PathState> = Vec::with_capacity(config.year_count());
        let mut collapse_year = None;
        for year in config.years() {
            if self.stop.is_stopped() {
                return None;
            }
            if collapse_year.is_none() {
                dynamics.step(&mut path, year, &mut shocks);
                if path.collapsed {
                    collapse_year = Some(year);
                }
            } else {
                path.state.year = year;
            }
            states.push(path.state);
        }

        assert_eq!(
            states.len(),
            config.year_count(),
            "trajectory length must match the simulated horizon"
        );
        Some(Trajectory::new(
            index,
            latent,
            path.effective_fusion_year(),
            states,
            collapse_year,
            path.clamp_events,
        ))
    }

    /// Simulate and aggregate.
    pub fn run(&self) -> Result<RunResult, SimulationError> {
        let started = Instant::now();
        let trajectories = self.simulate()?;
        let result = aggregate(&self.config, &trajectories);
        if result.clamp_events > 0 {
            tracing::warn!(
                target: "fusion_scenario::run",
                clamp_events = result.clamp_events,
                paths = result.paths,
                "run.values_clamped"
            );
        }
        tracing::info!(
            target: "fusion_scenario::run",
            fusion = %self.config.fusion.label(),
            paths = result.paths,
            elapsed_ms = started.elapsed().as_millis() as u64,
            mean_terminal_gdp = result.terminal.mean,
            p_abundance = result.probability_of_abundance,
            "run.completed"
        );
        Ok(result)
    }
}

/// Validate, simulate and aggregate one configuration.
pub fn run_scenario(config: &SimulationConfig) -> Result<RunResult, SimulationError> {
    Simulator::new(config.clone())?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario_config::FusionTiming;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            paths: 16,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn invalid_config_rejected_before_simulating() {
        let config = SimulationConfig {
            paths: 0,
            ..SimulationConfig::default()
        };
        let err = Simulator::new(config).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::InvalidConfig(ConfigError::Invalid { field: "paths", .. })
        ));
    }

    #[test]
    fn every_trajectory_covers_the_horizon() {
        let simulator = Simulator::new(small_config()).unwrap();
        let trajectories = simulator.simulate().unwrap();
        assert_eq!(trajectories.len(), 16);
        for (index, trajectory) in trajectories.iter().enumerate() {
            assert_eq!(trajectory.path_index(), index as u64);
            assert_eq!(trajectory.states().len(), 75);
            assert_eq!(trajectory.states()[0].year, 2026);
            assert_eq!(trajectory.terminal().year, 2100);
        }
    }

    #[test]
    fn collapsed_paths_carry_their_final_state() {
        let config = SimulationConfig {
            paths: 64,
            ..SimulationConfig::default()
        }
        .with_fusion(FusionTiming::Fixed { year: 2070 });
        let simulator = Simulator::new(config).unwrap();
        for trajectory in simulator.simulate().unwrap() {
            if let Some(year) = trajectory.collapse_year() {
                let offset = (year - 2026) as usize;
                let frozen = trajectory.states()[offset];
                for state in &trajectory.states()[offset..] {
                    assert_eq!(state.gdp, frozen.gdp);
                    assert_eq!(state.stability, frozen.stability);
                }
            }
        }
    }

    #[test]
    fn single_path_is_independent_of_batch() {
        let simulator = Simulator::new(small_config()).unwrap();
        let batch = simulator.simulate().unwrap();
        assert_eq!(simulator.simulate_path(7).unwrap(), batch[7]);
    }

    #[test]
    fn stopped_signal_cancels_run() {
        let stop = StopSignal::new();
        stop.stop();
        let simulator = Simulator::new(small_config())
            .unwrap()
            .with_stop_signal(stop);
        let err = simulator.simulate().unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Cancelled { completed_paths: 0 }
        ));
    }
}
