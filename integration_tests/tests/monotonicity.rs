mod common;

use common::reference_config;
use scenario_core::run_sweep;

#[test]
fn earlier_fusion_is_never_worse_in_expectation() {
    let config = reference_config(2_000);
    let sweep = run_sweep(&config, &[2030, 2035, 2040, 2045, 2050], None).expect("sweep");

    for pair in sweep.points.windows(2) {
        let (early, late) = (&pair[0], &pair[1]);
        assert!(
            early.result.terminal.mean >= late.result.terminal.mean,
            "mean terminal GDP rose when fusion moved from {} to {}: {} < {}",
            early.fusion_year,
            late.fusion_year,
            early.result.terminal.mean,
            late.result.terminal.mean
        );
        assert!(
            early.result.probability_of_abundance >= late.result.probability_of_abundance,
            "P(abundance) rose when fusion moved from {} to {}",
            early.fusion_year,
            late.fusion_year
        );
    }
    assert!(sweep.gradients.iter().all(|gradient| gradient.gdp_per_year <= 0.0));
    assert!(sweep
        .delay_costs
        .iter()
        .all(|cost| cost.terminal_per_year >= 0.0 && cost.cumulative_per_year >= 0.0));
}
