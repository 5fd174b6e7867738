//! One-year update of the coupled state of a single path.
//!
//! The order inside [`PathDynamics::step`] is fixed: climate shock, energy
//! and fusion, institutional stability and the collapse trigger, then
//! output. Random draws happen in that order too, which keeps paths
//! reproducible from their seed alone.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::model_config::{LatentPriors, ModelParameters};
use crate::scenario_config::FusionTiming;
use crate::state::{LatentDraws, PathState};

/// `ln(999)`: the logistic adoption curve starts at 0.1% share.
const ADOPTION_LEAD: f64 = 6.906_754_778_648_554;

/// Source of the random perturbations applied during a step.
pub trait ShockSource {
    /// Zero-mean normal draw.
    fn normal(&mut self, std_dev: f64) -> f64;
    /// Uniform draw in [0, 1).
    fn uniform(&mut self) -> f64;
}

/// Shocks sampled from a seeded generator.
pub struct SampledShocks<'a, R: Rng> {
    rng: &'a mut R,
}

impl<'a, R: Rng> SampledShocks<'a, R> {
    pub fn new(rng: &'a mut R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> ShockSource for SampledShocks<'_, R> {
    fn normal(&mut self, std_dev: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        z * std_dev
    }

    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Noise-free shocks: no weather, no conflict collapse.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuppressedShocks;

impl ShockSource for SuppressedShocks {
    fn normal(&mut self, _std_dev: f64) -> f64 {
        0.0
    }

    fn uniform(&mut self) -> f64 {
        1.0
    }
}

impl LatentDraws {
    /// Draw a path's latent parameters. The fusion year is drawn last so
    /// that configurations differing only in fusion timing share the rest.
    pub fn sample<R: Rng>(
        priors: &LatentPriors,
        fusion: &FusionTiming,
        beyond_horizon: f64,
        rng: &mut R,
    ) -> Self {
        let climate_sensitivity = priors.climate_sensitivity_mean
            + priors.climate_sensitivity_std_dev * rng.sample::<f64, _>(StandardNormal);
        let brittleness = priors.brittleness_low
            + (priors.brittleness_high - priors.brittleness_low) * rng.gen::<f64>();
        let base_growth = priors.base_growth_mean
            + priors.base_growth_std_dev * rng.sample::<f64, _>(StandardNormal);
        let fusion_year = match fusion {
            FusionTiming::Fixed { year } => *year as f64,
            FusionTiming::Normal { mean, std_dev } => {
                mean + std_dev * rng.sample::<f64, _>(StandardNormal)
            }
            FusionTiming::Schedule(schedule) => schedule.sample(rng.gen::<f64>(), beyond_horizon),
        };
        Self {
            climate_sensitivity,
            brittleness,
            base_growth,
            fusion_year,
        }
    }

    /// Latent parameters pinned at their prior means.
    pub fn at_means(priors: &LatentPriors, fusion_year: f64) -> Self {
        Self {
            climate_sensitivity: priors.climate_sensitivity_mean,
            brittleness: (priors.brittleness_low + priors.brittleness_high) / 2.0,
            base_growth: priors.base_growth_mean,
            fusion_year,
        }
    }
}

/// Mutable state of a path while it is being stepped.
#[derive(Debug, Clone)]
pub struct EvolvingPath {
    pub state: PathState,
    pub latent: LatentDraws,
    pub fusion_delay: f64,
    pub collapsed: bool,
    pub clamp_events: u32,
    last_drop: f64,
}

impl EvolvingPath {
    pub fn new(params: &ModelParameters, start_year: i32, latent: LatentDraws) -> Self {
        let initial = &params.initial;
        let survival_tax = damage_fraction(params, initial.temperature).clamp(0.0, 1.0);
        Self {
            state: PathState {
                year: start_year - 1,
                temperature: initial.temperature,
                eroi: initial.eroi,
                survival_tax,
                stability: initial.stability,
                gdp: initial.gdp,
            },
            latent,
            fusion_delay: 0.0,
            collapsed: false,
            clamp_events: 0,
            last_drop: 0.0,
        }
    }

    pub fn effective_fusion_year(&self) -> f64 {
        self.latent.fusion_year + self.fusion_delay
    }
}

/// Intermediate flows of a step, kept for diagnostic traces.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepDiagnostics {
    pub damages: f64,
    pub investment: f64,
    pub maintenance: f64,
    pub growth_dampener: f64,
    pub fusion_share: f64,
}

pub struct PathDynamics<'a> {
    params: &'a ModelParameters,
    start_year: i32,
    endogenous_delay: bool,
}

impl<'a> PathDynamics<'a> {
    pub fn new(params: &'a ModelParameters, start_year: i32, fusion: &FusionTiming) -> Self {
        Self {
            params,
            start_year,
            endogenous_delay: params.fusion_delay.enabled && fusion.is_stochastic(),
        }
    }

    /// Advance `path` through `year`.
    pub fn step<S: ShockSource>(
        &self,
        path: &mut EvolvingPath,
        year: i32,
        shocks: &mut S,
    ) -> StepDiagnostics {
        let p = self.params;
        let latent = path.latent;
        let mut s = path.state;
        s.year = year;
        let mut diagnostics = StepDiagnostics::default();

        // Climate shock.
        let elapsed = (year - self.start_year) as f64;
        let intensity = p.climate.warming_rate * (1.0 - p.climate.warming_decay * elapsed);
        let d_temp = intensity
            * (s.gdp / p.climate.reference_gdp)
            * (latent.climate_sensitivity / p.climate.reference_sensitivity)
            * (p.climate.reference_eroi / s.eroi)
            + shocks.normal(p.climate.warming_noise);
        s.temperature += d_temp.max(0.0);

        let raw_tax = damage_fraction(p, s.temperature);
        s.survival_tax = clamp_counted(raw_tax, 0.0, 1.0, &mut path.clamp_events);
        let damages = s.gdp * s.survival_tax;
        diagnostics.damages = damages;

        // Energy: fusion ramp or pre-fusion decay.
        let effective_fusion = path.effective_fusion_year();
        let year_f = year as f64;
        if self.endogenous_delay && year_f < effective_fusion {
            path.fusion_delay += p.fusion_delay.stability_weight * (1.0 - s.stability).max(0.0)
                + p.fusion_delay.output_weight * (1.0 - s.gdp / p.initial.gdp).max(0.0);
        }
        if year_f >= effective_fusion {
            let midpoint = effective_fusion + ADOPTION_LEAD / p.energy.adoption_k;
            let share = logistic(p.energy.adoption_k * (year_f - midpoint));
            diagnostics.fusion_share = share;
            s.eroi = (s.eroi + p.energy.fusion_gain * s.stability * share)
                .min(p.energy.eroi_ceiling);
        } else {
            let clean_share = p.energy.clean_ceiling
                * logistic(p.energy.clean_rate * (year_f - p.energy.clean_midpoint_year));
            s.eroi = (s.eroi - p.energy.eroi_decay - p.energy.warming_drag * s.temperature
                + clean_share * s.stability
                + shocks.normal(p.energy.eroi_noise))
            .max(p.energy.eroi_floor);
        }
        s.eroi = finite_or(s.eroi, p.energy.eroi_floor, &mut path.clamp_events);

        // Institutions.
        let velocity = path.last_drop / (s.gdp + 10.0);
        let stability_loss = damages / (s.gdp + 5.0)
            + p.stability.energy_stress / s.eroi
            + p.stability.velocity_weight * velocity;
        let stability = s.stability - p.stability.inst_coeff * stability_loss + p.stability.recovery;
        s.stability = clamp_counted(stability, 0.0, p.stability.ceiling, &mut path.clamp_events);

        let previous_gdp = s.gdp;
        if s.stability < latent.brittleness {
            let risk = p.stability.base_collapse_risk
                + p.stability.collapse_risk_slope * (latent.brittleness - s.stability);
            if shocks.uniform() < risk {
                s.gdp = p.output.collapse_floor;
                path.collapsed = true;
            }
        }

        // Output.
        if !path.collapsed {
            let dampener = 1.0 / (1.0 + (s.gdp / p.output.gdp_ceiling).powi(2));
            let investment = s.gdp
                * latent.base_growth
                * s.stability
                * (s.eroi / p.climate.reference_eroi)
                * dampener;
            let efficiency = (1.0 - s.eroi / p.output.efficiency_scale).max(p.output.efficiency_floor);
            let maintenance = s.gdp
                * p.output.maintenance_rate
                * (s.temperature / p.output.reference_temperature)
                * efficiency;
            s.gdp += investment - damages - maintenance;
            if s.gdp < p.output.collapse_threshold {
                s.gdp = p.output.collapse_floor;
                path.collapsed = true;
            }
            diagnostics.investment = investment;
            diagnostics.maintenance = maintenance;
            diagnostics.growth_dampener = dampener;
        }

        s.gdp = finite_or(s.gdp, 0.0, &mut path.clamp_events);
        if s.gdp < 0.0 {
            path.clamp_events += 1;
            s.gdp = 0.0;
        }
        path.last_drop = (previous_gdp - s.gdp).max(0.0);
        path.state = s;
        diagnostics
    }
}

/// Survival-basket tax before clamping.
pub fn damage_fraction(params: &ModelParameters, temperature: f64) -> f64 {
    params.climate.damage_coeff * temperature.max(0.0).powf(params.climate.damage_exp)
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn clamp_counted(value: f64, min: f64, max: f64, events: &mut u32) -> f64 {
    if value.is_nan() {
        *events += 1;
        return min;
    }
    if value < min || value > max {
        *events += 1;
    }
    value.clamp(min, max)
}

fn finite_or(value: f64, fallback: f64, events: &mut u32) -> f64 {
    if value.is_finite() {
        value
    } else {
        *events += 1;
        fallback
    }
}
