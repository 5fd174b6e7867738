//! Reduction of trajectories into run-level statistics.
//!
//! Counting statistics go through [`OutcomeTally`], which merges
//! associatively so the same numbers come out of a sequential fold or a
//! rayon tree reduction. Order statistics (percentiles, medians) are taken
//! from sorted samples.

use rayon::prelude::*;
use serde::Serialize;

use crate::scenario_config::{FusionTiming, SimulationConfig};
use crate::sensitivity::{latent_sensitivity, SensitivityEntry};
use crate::state::Trajectory;

/// Thresholds used to classify a trajectory's outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeCriteria {
    pub baseline: f64,
    pub abundance_threshold: f64,
    pub collapse_threshold: f64,
    pub recovery_grace_years: u32,
}

impl OutcomeCriteria {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            baseline: config.baseline_gdp(),
            abundance_threshold: config.abundance_threshold,
            collapse_threshold: config.model.output.collapse_threshold,
            recovery_grace_years: config.recovery_grace_years,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutcomeTally {
    pub paths: u64,
    pub terminal_gdp_sum: f64,
    pub abundant: u64,
    pub below_baseline: u64,
    pub never_recovered: u64,
    pub collapsed: u64,
    pub uninterrupted: u64,
    pub clamp_events: u64,
}

impl OutcomeTally {
    pub fn record(mut self, trajectory: &Trajectory, criteria: &OutcomeCriteria) -> Self {
        let terminal = trajectory.terminal_gdp();
        self.paths += 1;
        self.terminal_gdp_sum += terminal;
        self.abundant += u64::from(terminal > criteria.abundance_threshold);
        self.below_baseline += u64::from(terminal < criteria.baseline);
        self.never_recovered += u64::from(
            trajectory
                .recovery_year(criteria.baseline, criteria.recovery_grace_years)
                .is_none(),
        );
        self.collapsed += u64::from(trajectory.min_gdp() < criteria.collapse_threshold);
        self.uninterrupted += u64::from(trajectory.never_below(criteria.baseline));
        self.clamp_events += u64::from(trajectory.clamp_events());
        self
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            paths: self.paths + other.paths,
            terminal_gdp_sum: self.terminal_gdp_sum + other.terminal_gdp_sum,
            abundant: self.abundant + other.abundant,
            below_baseline: self.below_baseline + other.below_baseline,
            never_recovered: self.never_recovered + other.never_recovered,
            collapsed: self.collapsed + other.collapsed,
            uninterrupted: self.uninterrupted + other.uninterrupted,
            clamp_events: self.clamp_events + other.clamp_events,
        }
    }

    pub fn mean_terminal_gdp(&self) -> f64 {
        if self.paths == 0 {
            0.0
        } else {
            self.terminal_gdp_sum / self.paths as f64
        }
    }

    pub fn fraction(&self, count: u64) -> f64 {
        if self.paths == 0 {
            0.0
        } else {
            count as f64 / self.paths as f64
        }
    }
}

pub fn tally_sequential(trajectories: &[Trajectory], criteria: &OutcomeCriteria) -> OutcomeTally {
    trajectories
        .iter()
        .fold(OutcomeTally::default(), |tally, trajectory| {
            tally.record(trajectory, criteria)
        })
}

pub fn tally_parallel(trajectories: &[Trajectory], criteria: &OutcomeCriteria) -> OutcomeTally {
    trajectories
        .par_iter()
        .fold(OutcomeTally::default, |tally, trajectory| {
            tally.record(trajectory, criteria)
        })
        .reduce(OutcomeTally::default, OutcomeTally::merge)
}

/// Linear-interpolated percentile of an ascending slice, `q` in [0, 100].
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        len => {
            let rank = (q.clamp(0.0, 100.0) / 100.0) * (len - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(percentile(&sorted, 50.0))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalDistribution {
    #[serde(skip)]
    samples: Vec<f64>,
    pub mean: f64,
    pub median: f64,
    pub p10: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
}

impl TerminalDistribution {
    pub fn from_samples(mut samples: Vec<f64>, mean: f64) -> Self {
        samples.sort_by(f64::total_cmp);
        Self {
            mean,
            median: percentile(&samples, 50.0),
            p10: percentile(&samples, 10.0),
            p90: percentile(&samples, 90.0),
            min: samples.first().copied().unwrap_or(f64::NAN),
            max: samples.last().copied().unwrap_or(f64::NAN),
            samples,
        }
    }

    /// Ascending terminal GDP samples, one per path.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn percentile(&self, q: f64) -> f64 {
        percentile(&self.samples, q)
    }

    /// Fraction of paths with terminal GDP strictly above `threshold`.
    pub fn exceedance(&self, threshold: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let at_or_below = self.samples.partition_point(|value| *value <= threshold);
        (self.samples.len() - at_or_below) as f64 / self.samples.len() as f64
    }
}

/// Cross-path GDP statistics for one simulated year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearBand {
    pub year: i32,
    pub mean: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub fusion: FusionTiming,
    pub start_year: i32,
    pub end_year: i32,
    pub paths: u64,
    pub abundance_threshold: f64,
    pub baseline_gdp: f64,
    pub terminal: TerminalDistribution,
    pub probability_of_abundance: f64,
    /// Paths ending below the start-year output.
    pub below_baseline_fraction: f64,
    /// Paths that never rose above baseline after the grace period, or
    /// collapsed.
    pub never_recovered_fraction: f64,
    pub collapse_fraction: f64,
    pub uninterrupted_growth_fraction: f64,
    pub median_nadir_year: f64,
    pub median_recovery_years: Option<f64>,
    pub bands: Vec<YearBand>,
    /// Sum over years of the mean GDP path, trillion-dollar-years.
    pub cumulative_gdp: f64,
    pub sensitivity: Vec<SensitivityEntry>,
    pub clamp_events: u64,
}

impl RunResult {
    pub fn mean_trajectory(&self) -> impl Iterator<Item = f64> + '_ {
        self.bands.iter().map(|band| band.mean)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.bands.iter().map(|band| band.year)
    }
}

/// Aggregate with a sequential tally. Deterministic for a given input.
pub fn aggregate(config: &SimulationConfig, trajectories: &[Trajectory]) -> RunResult {
    let criteria = OutcomeCriteria::from_config(config);
    let tally = tally_sequential(trajectories, &criteria);
    build_result(config, trajectories, &criteria, tally)
}

/// Aggregate with a rayon tree reduction of the tally.
pub fn aggregate_parallel(config: &SimulationConfig, trajectories: &[Trajectory]) -> RunResult {
    let criteria = OutcomeCriteria::from_config(config);
    let tally = tally_parallel(trajectories, &criteria);
    build_result(config, trajectories, &criteria, tally)
}

fn build_result(
    config: &SimulationConfig,
    trajectories: &[Trajectory],
    criteria: &OutcomeCriteria,
    tally: OutcomeTally,
) -> RunResult {
    let terminal = TerminalDistribution::from_samples(
        trajectories.iter().map(Trajectory::terminal_gdp).collect(),
        tally.mean_terminal_gdp(),
    );

    let nadirs: Vec<f64> = trajectories
        .iter()
        .map(|trajectory| trajectory.nadir_year() as f64)
        .collect();
    let recoveries: Vec<f64> = trajectories
        .iter()
        .filter_map(|trajectory| {
            trajectory
                .recovery_year(criteria.baseline, criteria.recovery_grace_years)
                .map(|year| (year - config.start_year) as f64)
        })
        .collect();

    let bands = year_bands(config, trajectories);
    let cumulative_gdp = bands.iter().map(|band| band.mean).sum();

    RunResult {
        fusion: config.fusion.clone(),
        start_year: config.start_year,
        end_year: config.end_year,
        paths: tally.paths,
        abundance_threshold: criteria.abundance_threshold,
        baseline_gdp: criteria.baseline,
        terminal,
        probability_of_abundance: tally.fraction(tally.abundant),
        below_baseline_fraction: tally.fraction(tally.below_baseline),
        never_recovered_fraction: tally.fraction(tally.never_recovered),
        collapse_fraction: tally.fraction(tally.collapsed),
        uninterrupted_growth_fraction: tally.fraction(tally.uninterrupted),
        median_nadir_year: median(&nadirs).unwrap_or(f64::NAN),
        median_recovery_years: median(&recoveries),
        bands,
        cumulative_gdp,
        sensitivity: latent_sensitivity(trajectories),
        clamp_events: tally.clamp_events,
    }
}

fn year_bands(config: &SimulationConfig, trajectories: &[Trajectory]) -> Vec<YearBand> {
    let mut column = Vec::with_capacity(trajectories.len());
    config
        .years()
        .enumerate()
        .map(|(offset, year)| {
            column.clear();
            column.extend(trajectories.iter().map(|t| t.states()[offset].gdp));
            let mean = column.iter().sum::<f64>() / column.len().max(1) as f64;
            column.sort_by(f64::total_cmp);
            YearBand {
                year,
                mean,
                p10: percentile(&column, 10.0),
                p50: percentile(&column, 50.0),
                p90: percentile(&column, 90.0),
            }
        })
        .collect()
}

/// Cost of postponing fusion from one intervention year to a later one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DelayCost {
    pub early_year: i32,
    pub late_year: i32,
    pub terminal_gap: f64,
    pub terminal_per_year: f64,
    pub cumulative_gap: f64,
    pub cumulative_per_year: f64,
}

/// Expected value of delay between two fixed-year runs that differ only in
/// fusion timing. `None` unless both runs are interventions with
/// `early` strictly before `late`.
pub fn expected_value_of_delay(early: &RunResult, late: &RunResult) -> Option<DelayCost> {
    let early_year = early.fusion.fixed_year()?;
    let late_year = late.fusion.fixed_year()?;
    if late_year <= early_year {
        return None;
    }
    let years = (late_year - early_year) as f64;
    let terminal_gap = early.terminal.mean - late.terminal.mean;
    let cumulative_gap = early.cumulative_gdp - late.cumulative_gdp;
    Some(DelayCost {
        early_year,
        late_year,
        terminal_gap,
        terminal_per_year: terminal_gap / years,
        cumulative_gap,
        cumulative_per_year: cumulative_gap / years,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_like_numpy() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 50.0), 2.5);
        assert!((percentile(&sorted, 10.0) - 1.3).abs() < 1e-12);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
        assert_eq!(percentile(&[7.0], 90.0), 7.0);
    }

    #[test]
    fn exceedance_is_strict() {
        let dist = TerminalDistribution::from_samples(vec![600.0, 500.0, 100.0, 900.0], 525.0);
        assert_eq!(dist.exceedance(500.0), 0.5);
        assert_eq!(dist.samples(), &[100.0, 500.0, 600.0, 900.0]);
        assert_eq!(dist.median, 550.0);
    }

    #[test]
    fn tally_merge_is_associative() {
        let a = OutcomeTally {
            paths: 3,
            terminal_gdp_sum: 10.0,
            abundant: 1,
            ..Default::default()
        };
        let b = OutcomeTally {
            paths: 2,
            terminal_gdp_sum: 5.0,
            collapsed: 1,
            ..Default::default()
        };
        let c = OutcomeTally {
            paths: 5,
            terminal_gdp_sum: 1.0,
            never_recovered: 4,
            ..Default::default()
        };
        assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
        assert_eq!(a.merge(b).merge(c).paths, 10);
        assert_eq!(OutcomeTally::default().merge(a), a);
    }

    #[test]
    fn empty_tally_reports_zero_fractions() {
        let tally = OutcomeTally::default();
        assert_eq!(tally.fraction(0), 0.0);
        assert_eq!(tally.mean_terminal_gdp(), 0.0);
    }
}
