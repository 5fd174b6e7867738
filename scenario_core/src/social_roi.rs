//! Social return on accelerating fusion.
//!
//! Two interventions a few years apart give the annual GDP increment bought
//! by each year of acceleration. Discounting that stream and comparing it
//! with cumulative fusion spending gives the implied return on capex.

use serde::Serialize;

use crate::aggregate::RunResult;
use crate::scenario_config::SimulationConfig;
use crate::simulator::{SimulationError, Simulator, StopSignal};

const BREAK_EVEN_LOW: f64 = 0.01;
const BREAK_EVEN_HIGH: f64 = 5.0;
const BISECTION_STEPS: usize = 200;

/// Mean GDP gained per year of acceleration, year by year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccelerationGain {
    pub early_year: i32,
    pub late_year: i32,
    pub years: Vec<i32>,
    pub annual_increment: Vec<f64>,
    /// Sum of the annual increments, trillion-dollar-years.
    pub cumulative_per_year: f64,
    pub terminal_per_year: f64,
}

impl AccelerationGain {
    pub fn present_value(&self, reference_year: i32, rate: f64) -> f64 {
        present_value(&self.annual_increment, &self.years, reference_year, rate)
    }

    /// Ratio of cumulative to terminal-only gain. `None` when the terminal
    /// gain is zero.
    pub fn cumulative_multiple(&self) -> Option<f64> {
        (self.terminal_per_year != 0.0).then(|| self.cumulative_per_year / self.terminal_per_year)
    }
}

/// Build the gain from two fixed-year runs. `None` unless both are
/// interventions with `early` strictly first and matching horizons.
pub fn acceleration_gain(early: &RunResult, late: &RunResult) -> Option<AccelerationGain> {
    let early_year = early.fusion.fixed_year()?;
    let late_year = late.fusion.fixed_year()?;
    if late_year <= early_year || early.bands.len() != late.bands.len() {
        return None;
    }
    let span = (late_year - early_year) as f64;
    let annual_increment: Vec<f64> = early
        .mean_trajectory()
        .zip(late.mean_trajectory())
        .map(|(fast, slow)| (fast - slow) / span)
        .collect();
    Some(AccelerationGain {
        early_year,
        late_year,
        years: early.years().collect(),
        cumulative_per_year: annual_increment.iter().sum(),
        annual_increment,
        terminal_per_year: (early.terminal.mean - late.terminal.mean) / span,
    })
}

/// Continuously discounted value of `increments` received in `years`.
pub fn present_value(increments: &[f64], years: &[i32], reference_year: i32, rate: f64) -> f64 {
    increments
        .iter()
        .zip(years)
        .map(|(increment, year)| increment * (-rate * (year - reference_year) as f64).exp())
        .sum()
}

/// Rate in `[0.01, 5.0]` at which the present value equals `capex`, found by
/// bisection. `None` without a sign change over the bracket.
pub fn break_even_rate(gain: &AccelerationGain, reference_year: i32, capex: f64) -> Option<f64> {
    let excess = |rate: f64| gain.present_value(reference_year, rate) - capex;
    let (mut low, mut high) = (BREAK_EVEN_LOW, BREAK_EVEN_HIGH);
    let mut f_low = excess(low);
    let f_high = excess(high);
    if !f_low.is_finite() || !f_high.is_finite() || f_low.signum() == f_high.signum() {
        return None;
    }
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (low + high);
        let f_mid = excess(mid);
        if f_mid == 0.0 || (high - low) < 1e-12 {
            return Some(mid);
        }
        if f_mid.signum() == f_low.signum() {
            low = mid;
            f_low = f_mid;
        } else {
            high = mid;
        }
    }
    Some(0.5 * (low + high))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountedGain {
    pub rate: f64,
    pub label: String,
    pub present_value: f64,
    /// Present value as a multiple of cumulative fusion capex.
    pub capex_multiple: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiReport {
    pub gain: AccelerationGain,
    pub reference_year: i32,
    pub capex_trillions: f64,
    pub ladder: Vec<DiscountedGain>,
    /// Valuation at the configured discount rate.
    pub configured: DiscountedGain,
    pub break_even_rate: Option<f64>,
}

/// Value a gain under the configured ladder and discount rate.
pub fn evaluate_roi(config: &SimulationConfig, gain: AccelerationGain) -> RoiReport {
    let roi = &config.roi;
    let discounted = |rate: f64, label: String| {
        let present_value = gain.present_value(roi.reference_year, rate);
        DiscountedGain {
            rate,
            label,
            present_value,
            capex_multiple: present_value / roi.capex_trillions,
        }
    };
    let ladder = roi
        .discount_ladder
        .iter()
        .map(|entry| discounted(entry.rate, entry.label.clone()))
        .collect();
    let configured = discounted(config.discount_rate, "Configured".to_string());
    let break_even_rate = break_even_rate(&gain, roi.reference_year, roi.capex_trillions);
    RoiReport {
        reference_year: roi.reference_year,
        capex_trillions: roi.capex_trillions,
        ladder,
        configured,
        break_even_rate,
        gain,
    }
}

/// Run the configured early and late interventions and value the
/// difference.
pub fn run_social_roi(
    base: &SimulationConfig,
    stop: Option<&StopSignal>,
) -> Result<RoiReport, SimulationError> {
    let run_fixed = |year: i32| -> Result<RunResult, SimulationError> {
        let mut simulator = Simulator::new(base.with_fixed_fusion(year))?;
        if let Some(stop) = stop {
            simulator = simulator.with_stop_signal(stop.clone());
        }
        simulator.run()
    };
    let early = run_fixed(base.roi.early_year)?;
    let late = run_fixed(base.roi.late_year)?;
    let gain = acceleration_gain(&early, &late)
        .expect("validated roi window yields two ordered interventions");
    let report = evaluate_roi(base, gain);
    tracing::info!(
        target: "fusion_scenario::roi",
        early_year = report.gain.early_year,
        late_year = report.gain.late_year,
        cumulative_per_year = report.gain.cumulative_per_year,
        break_even_rate = ?report.break_even_rate,
        "roi.completed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gain_from(increments: Vec<f64>, start: i32) -> AccelerationGain {
        let years = (start..start + increments.len() as i32).collect();
        AccelerationGain {
            early_year: 2040,
            late_year: 2050,
            years,
            cumulative_per_year: increments.iter().sum(),
            terminal_per_year: *increments.last().unwrap(),
            annual_increment: increments,
        }
    }

    #[test]
    fn present_value_at_zero_rate_is_the_sum() {
        let gain = gain_from(vec![1.0, 2.0, 3.0], 2026);
        assert!((gain.present_value(2026, 0.0) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn present_value_discounts_continuously() {
        let pv = present_value(&[10.0], &[2036], 2026, 0.05);
        assert!((pv - 10.0 * (-0.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn break_even_recovers_known_rate() {
        let gain = gain_from(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0], 2026);
        let capex = (-0.5f64).exp();
        let rate = break_even_rate(&gain, 2026, capex).unwrap();
        assert!((rate - 0.05).abs() < 1e-9, "rate {rate}");
    }

    #[test]
    fn break_even_absent_without_sign_change() {
        let flat = gain_from(vec![0.0; 20], 2026);
        assert_eq!(break_even_rate(&flat, 2026, 0.1), None);
        let huge = gain_from(vec![1e9; 20], 2026);
        assert_eq!(break_even_rate(&huge, 2026, 0.1), None);
    }

    #[test]
    fn roi_report_covers_ladder_and_configured_rate() {
        let base = SimulationConfig {
            paths: 64,
            ..SimulationConfig::default()
        };
        let report = run_social_roi(&base, None).unwrap();
        assert_eq!(report.ladder.len(), base.roi.discount_ladder.len());
        assert_eq!(report.gain.years.len(), base.year_count());
        assert_eq!(report.configured.rate, base.discount_rate);
        let nordhaus = report
            .ladder
            .iter()
            .find(|entry| entry.rate == 0.05)
            .unwrap();
        assert_eq!(report.configured.present_value, nordhaus.present_value);
        assert!((report.configured.capex_multiple * base.roi.capex_trillions
            - report.configured.present_value)
            .abs()
            < 1e-6 * report.configured.present_value.abs().max(1.0));
    }

    #[test]
    fn acceleration_gain_requires_ordered_interventions() {
        let base = SimulationConfig {
            paths: 8,
            ..SimulationConfig::default()
        };
        let early = crate::run_scenario(&base.with_fixed_fusion(2040)).unwrap();
        let late = crate::run_scenario(&base.with_fixed_fusion(2050)).unwrap();
        assert!(acceleration_gain(&early, &late).is_some());
        assert!(acceleration_gain(&late, &early).is_none());
        let stochastic = crate::run_scenario(&base).unwrap();
        assert!(acceleration_gain(&stochastic, &late).is_none());
    }
}
