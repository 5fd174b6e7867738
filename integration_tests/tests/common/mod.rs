#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use scenario_core::SimulationConfig;

static INIT: Once = Once::new();

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = fixture_path("test_scenario_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test scenario config at {}",
            config_path.display()
        );

        std::env::set_var("SCENARIO_CONFIG_PATH", &config_path);
    });
}

/// Reference calibration with a reduced path count.
pub fn reference_config(paths: usize) -> SimulationConfig {
    SimulationConfig {
        paths,
        ..SimulationConfig::default()
    }
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Absolute difference check that reports both sides on failure.
pub fn assert_close(actual: f64, expected: f64, tolerance: f64, what: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{what}: {actual:.4} not within {tolerance} of {expected}"
    );
}
