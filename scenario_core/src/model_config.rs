//! Coefficients of the coupled climate, energy, institution and output
//! difference equations.
//!
//! The defaults are the reference calibration. Every field can be
//! overridden from JSON; missing fields fall back to the reference value.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelParameters {
    pub initial: InitialState,
    pub priors: LatentPriors,
    pub climate: ClimateParameters,
    pub energy: EnergyParameters,
    pub stability: StabilityParameters,
    pub output: OutputParameters,
    pub fusion_delay: FusionDelayParameters,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            initial: InitialState::default(),
            priors: LatentPriors::default(),
            climate: ClimateParameters::default(),
            energy: EnergyParameters::default(),
            stability: StabilityParameters::default(),
            output: OutputParameters::default(),
            fusion_delay: FusionDelayParameters::default(),
        }
    }
}

/// State of the world in the start year, before the first step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InitialState {
    /// Warming above pre-industrial, degrees C.
    pub temperature: f64,
    pub eroi: f64,
    /// Global output, trillions of dollars. Also the recovery baseline.
    pub gdp: f64,
    pub stability: f64,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            temperature: 1.3,
            eroi: 15.0,
            gdp: 105.0,
            stability: 1.0,
        }
    }
}

/// Distributions of the per-path latent parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LatentPriors {
    pub climate_sensitivity_mean: f64,
    pub climate_sensitivity_std_dev: f64,
    pub brittleness_low: f64,
    pub brittleness_high: f64,
    pub base_growth_mean: f64,
    pub base_growth_std_dev: f64,
}

impl Default for LatentPriors {
    fn default() -> Self {
        Self {
            climate_sensitivity_mean: 3.0,
            climate_sensitivity_std_dev: 0.4,
            brittleness_low: 0.1,
            brittleness_high: 0.25,
            base_growth_mean: 0.028,
            base_growth_std_dev: 0.006,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClimateParameters {
    pub warming_rate: f64,
    /// Fractional slowdown of emissions intensity per elapsed year.
    pub warming_decay: f64,
    pub warming_noise: f64,
    pub reference_gdp: f64,
    pub reference_sensitivity: f64,
    pub reference_eroi: f64,
    pub damage_coeff: f64,
    pub damage_exp: f64,
}

impl Default for ClimateParameters {
    fn default() -> Self {
        Self {
            warming_rate: 0.04,
            warming_decay: 0.018,
            warming_noise: 0.04,
            reference_gdp: 100.0,
            reference_sensitivity: 3.0,
            reference_eroi: 15.0,
            damage_coeff: 0.003,
            damage_exp: 2.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnergyParameters {
    pub eroi_decay: f64,
    /// EROI lost per degree of warming each year.
    pub warming_drag: f64,
    pub eroi_noise: f64,
    pub eroi_floor: f64,
    pub eroi_ceiling: f64,
    pub fusion_gain: f64,
    /// Steepness of the logistic fusion adoption curve.
    pub adoption_k: f64,
    pub clean_ceiling: f64,
    pub clean_rate: f64,
    pub clean_midpoint_year: f64,
}

impl Default for EnergyParameters {
    fn default() -> Self {
        Self {
            eroi_decay: 0.12,
            warming_drag: 0.03,
            eroi_noise: 0.04,
            eroi_floor: 1.0,
            eroi_ceiling: 100.0,
            fusion_gain: 3.5,
            adoption_k: 0.5,
            clean_ceiling: 0.08,
            clean_rate: 0.15,
            clean_midpoint_year: 2030.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StabilityParameters {
    pub inst_coeff: f64,
    pub energy_stress: f64,
    /// Weight of last year's output drop in stability loss. Zero in the
    /// reference calibration.
    pub velocity_weight: f64,
    pub recovery: f64,
    pub ceiling: f64,
    pub base_collapse_risk: f64,
    pub collapse_risk_slope: f64,
}

impl Default for StabilityParameters {
    fn default() -> Self {
        Self {
            inst_coeff: 0.035,
            energy_stress: 6.0,
            velocity_weight: 0.0,
            recovery: 0.006,
            ceiling: 1.2,
            base_collapse_risk: 0.02,
            collapse_risk_slope: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputParameters {
    /// Scale at which diminishing returns halve investment.
    pub gdp_ceiling: f64,
    pub maintenance_rate: f64,
    pub reference_temperature: f64,
    pub efficiency_floor: f64,
    pub efficiency_scale: f64,
    pub collapse_threshold: f64,
    pub collapse_floor: f64,
}

impl Default for OutputParameters {
    fn default() -> Self {
        Self {
            gdp_ceiling: 2000.0,
            maintenance_rate: 0.022,
            reference_temperature: 1.3,
            efficiency_floor: 0.5,
            efficiency_scale: 200.0,
            collapse_threshold: 1.05,
            collapse_floor: 0.5,
        }
    }
}

/// Slippage of a drawn fusion date while institutions or output are
/// degraded. Applies only to stochastic fusion timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FusionDelayParameters {
    pub enabled: bool,
    pub stability_weight: f64,
    pub output_weight: f64,
}

impl Default for FusionDelayParameters {
    fn default() -> Self {
        Self {
            enabled: true,
            stability_weight: 0.5,
            output_weight: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_reference_values() {
        let params: ModelParameters =
            serde_json::from_str(r#"{ "climate": { "damage_exp": 3.2 } }"#).unwrap();
        assert_eq!(params.climate.damage_exp, 3.2);
        assert_eq!(params.climate.damage_coeff, 0.003);
        assert_eq!(params.output, OutputParameters::default());
    }
}
