//! Robustness of headline outcomes to alternative calibrations.
//!
//! Variations are JSON patches deep-merged onto the base configuration, so
//! any field (model coefficient, fusion prior, threshold) can be varied
//! without code changes.

use std::{
    collections::HashSet,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::scenario_config::{ConfigError, SimulationConfig};
use crate::simulator::{SimulationError, Simulator, StopSignal};

pub const BUILTIN_CALIBRATION_VARIATIONS: &str =
    include_str!("data/calibration_variations.json");

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CalibrationCatalog {
    pub version: u32,
    pub variations: Vec<CalibrationVariation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CalibrationVariation {
    pub label: String,
    /// Deep-merge patch over the base configuration. Empty means baseline.
    pub patch: Value,
}

#[derive(Debug, Error)]
pub enum CalibrationCatalogError {
    #[error("failed to parse calibration catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read calibration catalog from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("duplicate calibration label {label}")]
    Duplicate { label: String },
    #[error("calibration {label} patch must be a JSON object")]
    PatchShape { label: String },
}

impl CalibrationCatalog {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            Self::from_json_str(BUILTIN_CALIBRATION_VARIATIONS)
                .expect("builtin calibration catalog should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, CalibrationCatalogError> {
        let catalog: CalibrationCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> Result<Self, CalibrationCatalogError> {
        let contents =
            fs::read_to_string(path).map_err(|source| CalibrationCatalogError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json_str(&contents)
    }

    pub fn variation(&self, label: &str) -> Option<&CalibrationVariation> {
        self.variations.iter().find(|entry| entry.label == label)
    }

    fn validate(&self) -> Result<(), CalibrationCatalogError> {
        let mut seen = HashSet::new();
        for variation in &self.variations {
            if !seen.insert(variation.label.as_str()) {
                return Err(CalibrationCatalogError::Duplicate {
                    label: variation.label.clone(),
                });
            }
            if !(variation.patch.is_object() || variation.patch.is_null()) {
                return Err(CalibrationCatalogError::PatchShape {
                    label: variation.label.clone(),
                });
            }
        }
        Ok(())
    }
}

pub fn load_calibration_catalog_from_env() -> Arc<CalibrationCatalog> {
    let Some(path) = env::var("CALIBRATION_VARIATIONS_PATH").ok().map(PathBuf::from) else {
        return CalibrationCatalog::builtin();
    };
    match CalibrationCatalog::from_file(&path) {
        Ok(catalog) => {
            tracing::info!(
                target: "fusion_scenario::config",
                path = %path.display(),
                "calibration_catalog.loaded=file"
            );
            Arc::new(catalog)
        }
        Err(err) => {
            tracing::warn!(
                target: "fusion_scenario::config",
                path = %path.display(),
                error = %err,
                "calibration_catalog.load_failed"
            );
            CalibrationCatalog::builtin()
        }
    }
}

#[derive(Debug, Error)]
pub enum RobustnessError {
    #[error("calibration {label} does not produce a valid config: {source}")]
    Patch {
        label: String,
        #[source]
        source: ConfigError,
    },
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobustnessRow {
    pub label: String,
    pub abundance: f64,
    pub never_recovered: f64,
    pub collapse: f64,
    pub median_terminal_gdp: f64,
    pub uninterrupted_growth: f64,
}

pub fn run_robustness(
    base: &SimulationConfig,
    catalog: &CalibrationCatalog,
    stop: Option<&StopSignal>,
) -> Result<Vec<RobustnessRow>, RobustnessError> {
    let mut rows = Vec::with_capacity(catalog.variations.len());
    for variation in &catalog.variations {
        let config = if variation.patch.is_null() {
            base.clone()
        } else {
            base.with_patch(&variation.patch)
                .map_err(|source| RobustnessError::Patch {
                    label: variation.label.clone(),
                    source,
                })?
        };
        let mut simulator = Simulator::new(config)?;
        if let Some(stop) = stop {
            simulator = simulator.with_stop_signal(stop.clone());
        }
        let result = simulator.run()?;
        tracing::info!(
            target: "fusion_scenario::robustness",
            label = %variation.label,
            abundance = result.probability_of_abundance,
            never_recovered = result.never_recovered_fraction,
            median_gdp = result.terminal.median,
            "robustness.variation_completed"
        );
        rows.push(RobustnessRow {
            label: variation.label.clone(),
            abundance: result.probability_of_abundance,
            never_recovered: result.never_recovered_fraction,
            collapse: result.collapse_fraction,
            median_terminal_gdp: result.terminal.median,
            uninterrupted_growth: result.uninterrupted_growth_fraction,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses_and_applies() {
        let catalog = CalibrationCatalog::builtin();
        assert_eq!(catalog.variations.len(), 11);
        let base = SimulationConfig::default();
        for variation in &catalog.variations {
            if !variation.patch.is_null() {
                base.with_patch(&variation.patch).unwrap();
            }
        }
        let steep = catalog.variation("Damage exp = 3.2").unwrap();
        let patched = base.with_patch(&steep.patch).unwrap();
        assert_eq!(patched.model.climate.damage_exp, 3.2);
    }

    #[test]
    fn duplicate_labels_rejected() {
        let json = r#"{ "variations": [ { "label": "a" }, { "label": "a" } ] }"#;
        assert!(matches!(
            CalibrationCatalog::from_json_str(json),
            Err(CalibrationCatalogError::Duplicate { .. })
        ));
    }

    #[test]
    fn invalid_patch_is_reported_with_label() {
        let catalog = CalibrationCatalog::from_json_str(
            r#"{ "variations": [ { "label": "bad", "patch": { "paths": -3 } } ] }"#,
        )
        .unwrap();
        let base = SimulationConfig {
            paths: 8,
            ..SimulationConfig::default()
        };
        match run_robustness(&base, &catalog, None) {
            Err(RobustnessError::Patch { label, .. }) => assert_eq!(label, "bad"),
            other => panic!("expected patch error, got {other:?}"),
        }
    }

    #[test]
    fn baseline_row_matches_direct_run() {
        let catalog = CalibrationCatalog::from_json_str(
            r#"{ "variations": [ { "label": "Baseline" } ] }"#,
        )
        .unwrap();
        let base = SimulationConfig {
            paths: 24,
            ..SimulationConfig::default()
        };
        let rows = run_robustness(&base, &catalog, None).unwrap();
        let direct = crate::run_scenario(&base).unwrap();
        assert_eq!(rows[0].abundance, direct.probability_of_abundance);
        assert_eq!(rows[0].median_terminal_gdp, direct.terminal.median);
    }
}
