mod common;

use common::reference_config;
use scenario_core::{run_scenario, Simulator};

#[test]
fn survival_tax_stays_in_unit_interval() {
    let simulator = Simulator::new(reference_config(10_000)).unwrap();
    let trajectories = simulator.simulate().unwrap();
    assert_eq!(trajectories.len(), 10_000);
    for trajectory in &trajectories {
        for state in trajectory.states() {
            assert!(
                (0.0..=1.0).contains(&state.survival_tax),
                "path {} year {} tax {}",
                trajectory.path_index(),
                state.year,
                state.survival_tax
            );
            assert!(state.gdp >= 0.0 && state.gdp.is_finite());
            assert!(state.eroi.is_finite());
        }
    }
}

#[test]
fn single_path_gives_a_degenerate_but_valid_result() {
    let result = run_scenario(&reference_config(1)).unwrap();
    assert_eq!(result.paths, 1);
    let terminal = &result.terminal;
    assert_eq!(terminal.samples().len(), 1);
    assert_eq!(terminal.mean, terminal.median);
    assert_eq!(terminal.p10, terminal.p90);
    assert_eq!(terminal.min, terminal.max);
    for fraction in [
        result.probability_of_abundance,
        result.below_baseline_fraction,
        result.never_recovered_fraction,
        result.collapse_fraction,
        result.uninterrupted_growth_fraction,
    ] {
        assert!(fraction == 0.0 || fraction == 1.0);
    }
    assert_eq!(result.bands.len(), 75);
    assert!(result.sensitivity.iter().all(|entry| entry.rho.is_none()));
}

#[test]
fn collapsed_paths_stay_flat() {
    let trajectories = Simulator::new(reference_config(2_000))
        .unwrap()
        .simulate()
        .unwrap();
    let collapsed: Vec<_> = trajectories.iter().filter(|t| t.collapsed()).collect();
    assert!(!collapsed.is_empty());
    for trajectory in collapsed {
        let year = trajectory.collapse_year().unwrap();
        let offset = (year - 2026) as usize;
        let after = &trajectory.states()[offset..];
        assert!(after.iter().all(|state| state.gdp == after[0].gdp));
    }
}
