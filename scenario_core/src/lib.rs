//! Monte Carlo scenarios of fusion energy timing and long-run world output.
//!
//! Each path couples warming, energy return on investment, institutional
//! stability and GDP through yearly difference equations, with latent
//! parameters drawn once per path from a seeded generator. [`run_scenario`]
//! simulates a configuration and reduces its trajectories to a
//! [`RunResult`]; sweeps, robustness tables and social-return estimates are
//! built from repeated runs.

pub mod aggregate;
pub mod dynamics;
mod hashing;
pub mod model_config;
pub mod outlook;
pub mod report;
pub mod robustness;
pub mod scenario_config;
pub mod sensitivity;
pub mod simulator;
pub mod social_roi;
pub mod state;
pub mod sweep;
pub mod trace;

pub use aggregate::{
    aggregate, aggregate_parallel, expected_value_of_delay, DelayCost, OutcomeCriteria,
    OutcomeTally, RunResult, TerminalDistribution, YearBand,
};
pub use hashing::{path_rng, path_seed};
pub use model_config::ModelParameters;
pub use outlook::{FusionSchedule, SchedulePoint, TechnologyOutlook};
pub use robustness::{
    load_calibration_catalog_from_env, run_robustness, CalibrationCatalog,
    CalibrationCatalogError, CalibrationVariation, RobustnessError, RobustnessRow,
};
pub use scenario_config::{
    load_scenario_config_from_env, ConfigError, FusionTiming, ScenarioConfigMetadata,
    SimulationConfig, BUILTIN_SCENARIO_CONFIG,
};
pub use sensitivity::{LatentFactor, SensitivityEntry};
pub use simulator::{run_scenario, SimulationError, Simulator, StopSignal};
pub use social_roi::{run_social_roi, AccelerationGain, DiscountedGain, RoiReport};
pub use state::{LatentDraws, PathState, Trajectory};
pub use sweep::{run_sweep, SweepGradient, SweepPoint, SweepResult};
pub use trace::{trace_path, TraceRow};
