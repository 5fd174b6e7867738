use serde::Serialize;

/// Snapshot of one path at the end of a simulated year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathState {
    pub year: i32,
    /// Warming above pre-industrial, degrees C.
    pub temperature: f64,
    /// Energy surplus, expressed as energy return on investment.
    pub eroi: f64,
    /// Share of output diverted to survival needs, in [0, 1].
    pub survival_tax: f64,
    pub stability: f64,
    /// Global output, trillions of dollars.
    pub gdp: f64,
}

/// Latent parameters drawn once per path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatentDraws {
    pub climate_sensitivity: f64,
    pub brittleness: f64,
    pub base_growth: f64,
    pub fusion_year: f64,
}

/// Year-by-year history of a single simulated path.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    path_index: u64,
    latent: LatentDraws,
    realized_fusion_year: f64,
    states: Vec<PathState>,
    collapse_year: Option<i32>,
    clamp_events: u32,
}

impl Trajectory {
    pub(crate) fn new(
        path_index: u64,
        latent: LatentDraws,
        realized_fusion_year: f64,
        states: Vec<PathState>,
        collapse_year: Option<i32>,
        clamp_events: u32,
    ) -> Self {
        assert!(!states.is_empty(), "trajectory must hold at least one year");
        Self {
            path_index,
            latent,
            realized_fusion_year,
            states,
            collapse_year,
            clamp_events,
        }
    }

    pub fn path_index(&self) -> u64 {
        self.path_index
    }

    pub fn latent(&self) -> &LatentDraws {
        &self.latent
    }

    /// Fusion year after endogenous delay.
    pub fn realized_fusion_year(&self) -> f64 {
        self.realized_fusion_year
    }

    pub fn states(&self) -> &[PathState] {
        &self.states
    }

    pub fn collapse_year(&self) -> Option<i32> {
        self.collapse_year
    }

    pub fn collapsed(&self) -> bool {
        self.collapse_year.is_some()
    }

    pub fn clamp_events(&self) -> u32 {
        self.clamp_events
    }

    pub fn terminal(&self) -> &PathState {
        self.states
            .last()
            .expect("trajectory holds at least one year")
    }

    pub fn terminal_gdp(&self) -> f64 {
        self.terminal().gdp
    }

    pub fn gdp(&self) -> impl Iterator<Item = f64> + '_ {
        self.states.iter().map(|state| state.gdp)
    }

    pub fn min_gdp(&self) -> f64 {
        self.gdp().fold(f64::INFINITY, f64::min)
    }

    /// First year in which output reached its minimum.
    pub fn nadir_year(&self) -> i32 {
        let mut nadir = self.states[0];
        for state in &self.states[1..] {
            if state.gdp < nadir.gdp {
                nadir = *state;
            }
        }
        nadir.year
    }

    /// First year after the grace period in which output exceeded
    /// `baseline`. Collapsed paths never recover.
    pub fn recovery_year(&self, baseline: f64, grace_years: u32) -> Option<i32> {
        if self.collapsed() {
            return None;
        }
        self.states
            .iter()
            .enumerate()
            .find(|(index, state)| *index > grace_years as usize && state.gdp > baseline)
            .map(|(_, state)| state.year)
    }

    pub fn never_below(&self, baseline: f64) -> bool {
        self.gdp().all(|gdp| gdp >= baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(year: i32, gdp: f64) -> PathState {
        PathState {
            year,
            temperature: 1.3,
            eroi: 15.0,
            survival_tax: 0.0,
            stability: 1.0,
            gdp,
        }
    }

    fn latent() -> LatentDraws {
        LatentDraws {
            climate_sensitivity: 3.0,
            brittleness: 0.175,
            base_growth: 0.028,
            fusion_year: 2035.0,
        }
    }

    fn trajectory(gdp: &[f64], collapse_year: Option<i32>) -> Trajectory {
        let states = gdp
            .iter()
            .enumerate()
            .map(|(i, value)| state(2026 + i as i32, *value))
            .collect();
        Trajectory::new(0, latent(), 2035.0, states, collapse_year, 0)
    }

    #[test]
    fn recovery_ignores_grace_period() {
        let path = trajectory(&[106.0, 100.0, 99.0, 101.0, 104.0, 106.0, 104.0, 107.0], None);
        assert_eq!(path.recovery_year(105.0, 5), Some(2033));
        assert!(!path.never_below(105.0));
    }

    #[test]
    fn collapsed_paths_never_recover() {
        let path = trajectory(&[104.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5], Some(2027));
        assert_eq!(path.recovery_year(105.0, 5), None);
        assert_eq!(path.nadir_year(), 2027);
        assert_eq!(path.min_gdp(), 0.5);
        assert_eq!(path.terminal_gdp(), 0.5);
    }
}
