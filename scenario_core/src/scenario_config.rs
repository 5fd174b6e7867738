//! Experiment configuration.
//!
//! Loaded from `scenario_config.json` with support for an environment
//! variable override and JSON patches for calibration variants.

use std::{
    env, fs, io,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model_config::ModelParameters;
use crate::outlook::{FusionSchedule, TechnologyOutlook};

pub const BUILTIN_SCENARIO_CONFIG: &str = include_str!("data/scenario_config.json");

/// Longest simulated horizon accepted, in years.
pub const MAX_HORIZON_YEARS: i32 = 1_000;

/// When fusion energy becomes commercially available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FusionTiming {
    /// Every path gets the same date: the intervention do(year).
    Fixed { year: i32 },
    /// Per-path date drawn from a normal prior.
    Normal { mean: f64, std_dev: f64 },
    /// Per-path date drawn from an external cumulative schedule.
    Schedule(FusionSchedule),
}

impl FusionTiming {
    pub fn is_stochastic(&self) -> bool {
        !matches!(self, FusionTiming::Fixed { .. })
    }

    pub fn fixed_year(&self) -> Option<i32> {
        match self {
            FusionTiming::Fixed { year } => Some(*year),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            FusionTiming::Fixed { year } => format!("do({year})"),
            FusionTiming::Normal { mean, std_dev } => format!("N({mean}, {std_dev})"),
            FusionTiming::Schedule(schedule) => match (schedule.first_year(), schedule.last_year())
            {
                (Some(first), Some(last)) => format!("schedule {first}..{last}"),
                _ => "schedule".to_string(),
            },
        }
    }
}

impl Default for FusionTiming {
    fn default() -> Self {
        FusionTiming::Normal {
            mean: 2035.0,
            std_dev: 7.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountRate {
    pub rate: f64,
    pub label: String,
}

/// Parameters for valuing a year of fusion acceleration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoiConfig {
    /// Year that discounting is measured from.
    pub reference_year: i32,
    /// Cumulative global fusion spending, trillions of dollars.
    pub capex_trillions: f64,
    pub early_year: i32,
    pub late_year: i32,
    pub discount_ladder: Vec<DiscountRate>,
}

impl Default for RoiConfig {
    fn default() -> Self {
        let ladder = [
            (0.014, "Stern Review"),
            (0.03, "Ramsey moderate"),
            (0.05, "Nordhaus"),
            (0.10, "High"),
            (0.15, "Very high"),
            (0.20, "Extreme"),
            (0.30, "Absurd"),
            (0.50, "Inconceivable"),
        ];
        Self {
            reference_year: 2026,
            capex_trillions: 0.1,
            early_year: 2040,
            late_year: 2050,
            discount_ladder: ladder
                .iter()
                .map(|(rate, label)| DiscountRate {
                    rate: *rate,
                    label: label.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub from: i32,
    pub to: i32,
    pub step: u32,
}

impl SweepConfig {
    pub fn years(&self) -> Vec<i32> {
        let step = self.step.max(1) as usize;
        (self.from..=self.to).step_by(step).collect()
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            from: 2030,
            to: 2060,
            step: 5,
        }
    }
}

/// Root configuration for one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub start_year: i32,
    /// Last simulated year, inclusive.
    pub end_year: i32,
    pub paths: usize,
    pub seed: u64,
    pub fusion: FusionTiming,
    pub discount_rate: f64,
    /// Terminal GDP, trillions, above which a path counts as abundance.
    pub abundance_threshold: f64,
    /// How far past the end year a fusion date may fall.
    pub fusion_year_slack: i32,
    /// Years before a return above baseline counts as recovery.
    pub recovery_grace_years: u32,
    pub model: ModelParameters,
    pub roi: RoiConfig,
    pub sweep: SweepConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_year: 2026,
            end_year: 2100,
            paths: 10_000,
            seed: 42,
            fusion: FusionTiming::default(),
            discount_rate: 0.05,
            abundance_threshold: 500.0,
            fusion_year_slack: 25,
            recovery_grace_years: 5,
            model: ModelParameters::default(),
            roi: RoiConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse scenario config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read scenario config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl SimulationConfig {
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_SCENARIO_CONFIG)
            .expect("builtin scenario config should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    pub fn year_count(&self) -> usize {
        (i64::from(self.end_year) - i64::from(self.start_year) + 1).max(0) as usize
    }

    pub fn baseline_gdp(&self) -> f64 {
        self.model.initial.gdp
    }

    /// Latest admissible fusion year.
    pub fn fusion_horizon(&self) -> i32 {
        self.end_year.saturating_add(self.fusion_year_slack)
    }

    pub fn with_fusion(&self, fusion: FusionTiming) -> Self {
        Self {
            fusion,
            ..self.clone()
        }
    }

    pub fn with_fixed_fusion(&self, year: i32) -> Self {
        self.with_fusion(FusionTiming::Fixed { year })
    }

    pub fn with_outlook(&self, outlook: &dyn TechnologyOutlook) -> Self {
        self.with_fusion(FusionTiming::Schedule(outlook.fusion_schedule()))
    }

    /// Deep-merge a JSON object onto this config and re-validate.
    pub fn with_patch(&self, patch: &Value) -> Result<Self, ConfigError> {
        let mut merged = serde_json::to_value(self)?;
        merge_json(&mut merged, patch);
        let config: SimulationConfig = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.end_year <= self.start_year {
            return Err(invalid(
                "end_year",
                format!(
                    "end year {} must be after start year {}",
                    self.end_year, self.start_year
                ),
            ));
        }
        match self.end_year.checked_sub(self.start_year) {
            Some(span) if span < MAX_HORIZON_YEARS => {}
            _ => {
                return Err(invalid(
                    "end_year",
                    format!(
                        "{}..={} spans more than {MAX_HORIZON_YEARS} years",
                        self.start_year, self.end_year
                    ),
                ))
            }
        }
        if self.paths == 0 {
            return Err(invalid("paths", "at least one path is required"));
        }
        if self.fusion_year_slack < 0 {
            return Err(invalid("fusion_year_slack", "slack cannot be negative"));
        }
        if self.end_year.checked_add(self.fusion_year_slack).is_none() {
            return Err(invalid(
                "fusion_year_slack",
                format!(
                    "end year {} plus slack {} overflows",
                    self.end_year, self.fusion_year_slack
                ),
            ));
        }
        self.validate_fusion()?;
        if !self.discount_rate.is_finite() || self.discount_rate < 0.0 {
            return Err(invalid(
                "discount_rate",
                format!("{} is not a non-negative rate", self.discount_rate),
            ));
        }
        if !self.abundance_threshold.is_finite() || self.abundance_threshold <= 0.0 {
            return Err(invalid(
                "abundance_threshold",
                format!("{} must be positive", self.abundance_threshold),
            ));
        }
        self.validate_model()?;
        if self.sweep.step == 0 || self.sweep.from > self.sweep.to {
            return Err(invalid(
                "sweep",
                format!(
                    "{}..={} step {} is empty",
                    self.sweep.from, self.sweep.to, self.sweep.step
                ),
            ));
        }
        if self.roi.early_year >= self.roi.late_year {
            return Err(invalid(
                "roi.early_year",
                format!(
                    "early year {} must precede late year {}",
                    self.roi.early_year, self.roi.late_year
                ),
            ));
        }
        if !self.roi.capex_trillions.is_finite() || self.roi.capex_trillions <= 0.0 {
            return Err(invalid("roi.capex_trillions", "capex must be positive"));
        }
        Ok(())
    }

    fn validate_fusion(&self) -> Result<(), ConfigError> {
        let earliest = self.start_year as f64;
        let latest = self.fusion_horizon() as f64;
        match &self.fusion {
            FusionTiming::Fixed { year } => {
                if *year < self.start_year || *year > self.fusion_horizon() {
                    return Err(invalid(
                        "fusion.year",
                        format!(
                            "{year} is outside [{}, {}]",
                            self.start_year,
                            self.fusion_horizon()
                        ),
                    ));
                }
            }
            FusionTiming::Normal { mean, std_dev } => {
                if !mean.is_finite() || *mean < earliest || *mean > latest {
                    return Err(invalid(
                        "fusion.mean",
                        format!("{mean} is outside [{earliest}, {latest}]"),
                    ));
                }
                if !std_dev.is_finite() || *std_dev < 0.0 {
                    return Err(invalid(
                        "fusion.std_dev",
                        format!("{std_dev} is not a valid standard deviation"),
                    ));
                }
            }
            FusionTiming::Schedule(schedule) => {
                schedule
                    .validate()
                    .map_err(|reason| invalid("fusion.points", reason))?;
                if let (Some(first), Some(last)) = (schedule.first_year(), schedule.last_year()) {
                    if first < earliest || last > latest {
                        return Err(invalid(
                            "fusion.points",
                            format!("{first}..{last} is outside [{earliest}, {latest}]"),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_model(&self) -> Result<(), ConfigError> {
        let priors = &self.model.priors;
        for (field, value) in [
            (
                "model.priors.climate_sensitivity_std_dev",
                priors.climate_sensitivity_std_dev,
            ),
            (
                "model.priors.base_growth_std_dev",
                priors.base_growth_std_dev,
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("{value} is not a valid standard deviation")));
            }
        }
        if !(priors.brittleness_low <= priors.brittleness_high) {
            return Err(invalid(
                "model.priors.brittleness_low",
                format!(
                    "low bound {} exceeds high bound {}",
                    priors.brittleness_low, priors.brittleness_high
                ),
            ));
        }
        let initial = &self.model.initial;
        if !(initial.gdp > 0.0) {
            return Err(invalid("model.initial.gdp", "baseline output must be positive"));
        }
        if !(initial.eroi > 0.0) {
            return Err(invalid("model.initial.eroi", "initial EROI must be positive"));
        }
        if !(self.model.energy.eroi_floor > 0.0) {
            return Err(invalid(
                "model.energy.eroi_floor",
                "EROI floor must be positive",
            ));
        }
        if !(self.model.energy.adoption_k > 0.0) {
            return Err(invalid(
                "model.energy.adoption_k",
                "adoption steepness must be positive",
            ));
        }
        if !(self.model.output.gdp_ceiling > 0.0) {
            return Err(invalid(
                "model.output.gdp_ceiling",
                "output ceiling must be positive",
            ));
        }
        Ok(())
    }
}

fn merge_json(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ScenarioConfigMetadata {
    path: Option<PathBuf>,
}

impl ScenarioConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

pub fn load_scenario_config_from_env() -> (SimulationConfig, ScenarioConfigMetadata) {
    let override_path = env::var("SCENARIO_CONFIG_PATH").ok().map(PathBuf::from);
    let default_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/scenario_config.json");

    let candidates: Vec<PathBuf> = match override_path {
        Some(ref path) => vec![path.clone()],
        None => vec![default_path.clone()],
    };

    for path in candidates {
        match SimulationConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "fusion_scenario::config",
                    path = %path.display(),
                    "scenario_config.loaded=file"
                );
                return (config, ScenarioConfigMetadata::new(Some(path)));
            }
            Err(err) => {
                tracing::warn!(
                    target: "fusion_scenario::config",
                    path = %path.display(),
                    error = %err,
                    "scenario_config.load_failed"
                );
            }
        }
    }

    let config = SimulationConfig::builtin();
    tracing::info!(
        target: "fusion_scenario::config",
        "scenario_config.loaded=builtin"
    );
    (config, ScenarioConfigMetadata::new(None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invalid_field(result: Result<(), ConfigError>) -> &'static str {
        match result {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn builtin_config_matches_defaults() {
        let builtin = SimulationConfig::builtin();
        assert_eq!(builtin, SimulationConfig::default());
        builtin.validate().unwrap();
    }

    #[test]
    fn reversed_years_name_end_year() {
        let config = SimulationConfig {
            end_year: 2026,
            ..SimulationConfig::default()
        };
        assert_eq!(invalid_field(config.validate()), "end_year");
    }

    #[test]
    fn extreme_years_rejected_without_overflow() {
        for (json, field) in [
            (r#"{ "end_year": 2147483647 }"#, "end_year"),
            (r#"{ "start_year": -2147483648 }"#, "end_year"),
            (r#"{ "start_year": -1000000000, "end_year": 1000000000 }"#, "end_year"),
            (r#"{ "fusion_year_slack": 2147483647 }"#, "fusion_year_slack"),
        ] {
            match SimulationConfig::from_json_str(json) {
                Err(ConfigError::Invalid { field: actual, .. }) => assert_eq!(actual, field, "{json}"),
                other => panic!("expected invalid {field} for {json}, got {other:?}"),
            }
        }
    }

    #[test]
    fn longest_accepted_horizon() {
        let config = SimulationConfig {
            end_year: 2026 + MAX_HORIZON_YEARS - 1,
            ..SimulationConfig::default()
        };
        config.validate().unwrap();
        assert_eq!(config.year_count(), MAX_HORIZON_YEARS as usize);
    }

    #[test]
    fn zero_paths_rejected() {
        let config = SimulationConfig {
            paths: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(invalid_field(config.validate()), "paths");
    }

    #[test]
    fn fixed_fusion_year_bounded_by_slack() {
        let base = SimulationConfig::default();
        assert!(base.with_fixed_fusion(2026).validate().is_ok());
        assert!(base.with_fixed_fusion(2125).validate().is_ok());
        assert_eq!(
            invalid_field(base.with_fixed_fusion(2126).validate()),
            "fusion.year"
        );
        assert_eq!(
            invalid_field(base.with_fixed_fusion(2025).validate()),
            "fusion.year"
        );
    }

    #[test]
    fn negative_std_dev_rejected() {
        let config = SimulationConfig::default().with_fusion(FusionTiming::Normal {
            mean: 2035.0,
            std_dev: -1.0,
        });
        assert_eq!(invalid_field(config.validate()), "fusion.std_dev");
    }

    #[test]
    fn fusion_timing_round_trips_through_tagged_json() {
        let config: SimulationConfig =
            serde_json::from_value(json!({ "fusion": { "kind": "fixed", "year": 2030 } }))
                .unwrap();
        assert_eq!(config.fusion, FusionTiming::Fixed { year: 2030 });
        assert_eq!(config.end_year, 2100);
    }

    #[test]
    fn patch_merges_nested_fields() {
        let base = SimulationConfig::default();
        let patched = base
            .with_patch(&json!({ "model": { "climate": { "damage_exp": 3.2 } }, "fusion": { "mean": 2045.0 } }))
            .unwrap();
        assert_eq!(patched.model.climate.damage_exp, 3.2);
        assert_eq!(patched.model.climate.damage_coeff, 0.003);
        assert_eq!(
            patched.fusion,
            FusionTiming::Normal {
                mean: 2045.0,
                std_dev: 7.0
            }
        );
    }

    #[test]
    fn patch_that_breaks_invariants_is_rejected() {
        let err = SimulationConfig::default()
            .with_patch(&json!({ "paths": 0 }))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "paths", .. }));
    }

    #[test]
    fn sweep_years_are_inclusive() {
        assert_eq!(
            SweepConfig::default().years(),
            vec![2030, 2035, 2040, 2045, 2050, 2055, 2060]
        );
    }
}
