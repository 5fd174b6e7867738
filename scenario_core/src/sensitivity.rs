use serde::Serialize;

use crate::state::Trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatentFactor {
    FusionYear,
    ClimateSensitivity,
    Brittleness,
    BaseGrowth,
}

impl LatentFactor {
    pub const ALL: [LatentFactor; 4] = [
        LatentFactor::FusionYear,
        LatentFactor::ClimateSensitivity,
        LatentFactor::Brittleness,
        LatentFactor::BaseGrowth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LatentFactor::FusionYear => "fusion year",
            LatentFactor::ClimateSensitivity => "climate sensitivity",
            LatentFactor::Brittleness => "brittleness",
            LatentFactor::BaseGrowth => "base growth",
        }
    }

    fn value(&self, trajectory: &Trajectory) -> f64 {
        let latent = trajectory.latent();
        match self {
            LatentFactor::FusionYear => trajectory.realized_fusion_year(),
            LatentFactor::ClimateSensitivity => latent.climate_sensitivity,
            LatentFactor::Brittleness => latent.brittleness,
            LatentFactor::BaseGrowth => latent.base_growth,
        }
    }
}

/// Spearman rank correlation of one latent factor with terminal GDP.
/// `rho` is `None` when either side has no variation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensitivityEntry {
    pub factor: LatentFactor,
    pub rho: Option<f64>,
}

pub fn latent_sensitivity(trajectories: &[Trajectory]) -> Vec<SensitivityEntry> {
    let terminal: Vec<f64> = trajectories.iter().map(Trajectory::terminal_gdp).collect();
    LatentFactor::ALL
        .iter()
        .map(|factor| {
            let values: Vec<f64> = trajectories.iter().map(|t| factor.value(t)).collect();
            SensitivityEntry {
                factor: *factor,
                rho: spearman(&values, &terminal),
            }
        })
        .collect()
}

/// Ranks starting at 1, ties sharing their average rank.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|a, b| values[*a].total_cmp(&values[*b]));
    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for index in &order[start..end] {
            ranks[*index] = rank;
        }
        start = end;
    }
    ranks
}

pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_share_average_rank() {
        assert_eq!(average_ranks(&[10.0, 20.0, 10.0, 30.0]), vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn monotone_relationships_are_perfectly_ranked() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let up = [1.0, 4.0, 9.0, 16.0, 25.0];
        let down = [5.0, 3.0, 2.0, 1.0, 0.5];
        assert!((spearman(&x, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((spearman(&x, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_input_has_no_correlation() {
        assert_eq!(spearman(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(spearman(&[1.0], &[1.0]), None);
    }
}
