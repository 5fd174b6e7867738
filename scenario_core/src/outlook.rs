//! Fusion timing supplied by an external technology-planning service.
//!
//! The service itself lives elsewhere; this module only fixes the shape of
//! what it hands the simulator: a cumulative probability of fusion being
//! commercialized by each year.

use serde::{Deserialize, Serialize};

/// Source of a fusion commercialization outlook, such as a technology
/// dependency graph that scores investment trajectories.
pub trait TechnologyOutlook {
    fn fusion_schedule(&self) -> FusionSchedule;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulePoint {
    pub year: f64,
    pub cumulative_probability: f64,
}

/// Piecewise-linear cumulative distribution of the fusion year.
///
/// Probability mass left above the last point means fusion does not arrive
/// within the simulated horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionSchedule {
    pub points: Vec<SchedulePoint>,
}

impl FusionSchedule {
    pub fn new(points: Vec<SchedulePoint>) -> Self {
        Self { points }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.points.is_empty() {
            return Err("schedule needs at least one point".to_string());
        }
        let mut previous: Option<&SchedulePoint> = None;
        for point in &self.points {
            if !point.year.is_finite() {
                return Err(format!("year {} is not finite", point.year));
            }
            if !(0.0..=1.0).contains(&point.cumulative_probability) {
                return Err(format!(
                    "cumulative probability {} at {} is outside [0, 1]",
                    point.cumulative_probability, point.year
                ));
            }
            if let Some(prev) = previous {
                if point.year <= prev.year {
                    return Err(format!("years must increase, {} follows {}", point.year, prev.year));
                }
                if point.cumulative_probability < prev.cumulative_probability {
                    return Err(format!(
                        "cumulative probability decreases at {}",
                        point.year
                    ));
                }
            }
            previous = Some(point);
        }
        Ok(())
    }

    pub fn first_year(&self) -> Option<f64> {
        self.points.first().map(|point| point.year)
    }

    pub fn last_year(&self) -> Option<f64> {
        self.points.last().map(|point| point.year)
    }

    /// Probability that fusion has arrived by `year`.
    pub fn probability_by(&self, year: f64) -> f64 {
        let Some(first) = self.points.first() else {
            return 0.0;
        };
        if year < first.year {
            return 0.0;
        }
        for window in self.points.windows(2) {
            let (lo, hi) = (window[0], window[1]);
            if year < hi.year {
                let t = (year - lo.year) / (hi.year - lo.year);
                return lo.cumulative_probability
                    + t * (hi.cumulative_probability - lo.cumulative_probability);
            }
        }
        self.points
            .last()
            .map(|point| point.cumulative_probability)
            .unwrap_or(0.0)
    }

    /// Inverse-CDF sample for a uniform draw `u` in [0, 1).
    ///
    /// Returns `beyond_horizon` when `u` lands in the residual mass.
    pub fn sample(&self, u: f64, beyond_horizon: f64) -> f64 {
        let Some(first) = self.points.first() else {
            return beyond_horizon;
        };
        if u < first.cumulative_probability {
            return first.year;
        }
        for window in self.points.windows(2) {
            let (lo, hi) = (window[0], window[1]);
            if u < hi.cumulative_probability {
                let span = hi.cumulative_probability - lo.cumulative_probability;
                let t = (u - lo.cumulative_probability) / span;
                return lo.year + t * (hi.year - lo.year);
            }
        }
        beyond_horizon
    }
}

impl TechnologyOutlook for FusionSchedule {
    fn fusion_schedule(&self) -> FusionSchedule {
        self.clone()
    }
}
