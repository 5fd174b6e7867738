mod common;

use common::{assert_close, fixture_path, reference_config};
use scenario_core::{
    load_scenario_config_from_env, run_scenario, FusionSchedule, FusionTiming, SchedulePoint,
    SimulationConfig, SimulationError, Simulator, StopSignal, TechnologyOutlook,
};

struct FixedOutlook;

impl TechnologyOutlook for FixedOutlook {
    fn fusion_schedule(&self) -> FusionSchedule {
        FusionSchedule::new(vec![
            SchedulePoint {
                year: 2030.0,
                cumulative_probability: 0.0,
            },
            SchedulePoint {
                year: 2040.0,
                cumulative_probability: 0.5,
            },
            SchedulePoint {
                year: 2060.0,
                cumulative_probability: 0.8,
            },
        ])
    }
}

#[test]
fn env_override_config_is_loaded() {
    common::ensure_test_config();
    let (config, metadata) = load_scenario_config_from_env();
    assert!(metadata.path().is_some());
    assert_eq!(config.paths, 200);
    assert_eq!(config.seed, 7);
    assert_eq!(config.model.climate.damage_exp, 2.4);
    assert_eq!(config.model.climate.damage_coeff, 0.003);
    assert_eq!(config.sweep.years(), vec![2030, 2035, 2040]);
    run_scenario(&config).unwrap();
}

#[test]
fn outlook_schedule_drives_fusion_years() {
    let config = reference_config(1_000).with_outlook(&FixedOutlook);
    assert!(matches!(config.fusion, FusionTiming::Schedule(_)));
    let trajectories = Simulator::new(config.clone()).unwrap().simulate().unwrap();

    let drawn: Vec<f64> = trajectories
        .iter()
        .map(|trajectory| trajectory.latent().fusion_year)
        .collect();
    assert!(drawn.iter().all(|year| *year >= 2030.0));
    let never = drawn
        .iter()
        .filter(|year| **year > config.fusion_horizon() as f64)
        .count() as f64
        / drawn.len() as f64;
    assert_close(never, 0.2, 0.04, "share beyond the outlook");
    let by_2040 = drawn.iter().filter(|year| **year <= 2040.0).count() as f64 / drawn.len() as f64;
    assert_close(by_2040, 0.5, 0.05, "share by 2040");
}

#[test]
fn stopped_run_reports_cancellation() {
    let stop = StopSignal::new();
    stop.stop();
    let simulator = Simulator::new(reference_config(50))
        .unwrap()
        .with_stop_signal(stop);
    match simulator.run() {
        Err(SimulationError::Cancelled { completed_paths }) => assert_eq!(completed_paths, 0),
        other => panic!("expected cancellation, got {other:?}"),
    }
}

#[test]
fn config_file_round_trips() -> anyhow::Result<()> {
    let path = fixture_path("test_scenario_config.json");
    let config = SimulationConfig::from_file(&path)?;
    let json = serde_json::to_string(&config)?;
    let reparsed = SimulationConfig::from_json_str(&json)?;
    assert_eq!(config, reparsed);
    Ok(())
}
