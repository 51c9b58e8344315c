//! Integration tests for the passage driver.
//!
//! Tests verify:
//! - First-passage growth from the documented inoculum
//! - Cell-count conservation across dilutions
//! - Culture clock and chart series offsets
//! - Target evaluation for the documented five-vessel train
//! - Negative-concentration policy and configuration errors

use cell_passage_sim::config::{
    KineticParameters, NegativityPolicy, Parameters, PassageDescriptor, ProcessParameters,
};
use cell_passage_sim::IntegratorConfig;
use cell_passage_sim::scaleup::{dilute, PassageDriver, ScaleUpReport};
use cell_passage_sim::{ConfigError, SimulationError};

fn run_default() -> ScaleUpReport {
    let driver = PassageDriver::from_parameters(&Parameters::default()).unwrap();
    driver.run().expect("default train should complete under the warn policy")
}

fn relative_error(a: f64, b: f64) -> f64 {
    (a - b).abs() / b.abs()
}

// ============================================================================
// First passage
// ============================================================================

#[test]
fn test_first_passage_grows() {
    let process = ProcessParameters {
        passages: vec![PassageDescriptor::new(0.1e-3, 16.0)],
        ..Default::default()
    };
    let driver = PassageDriver::new(KineticParameters::default(), process).unwrap();
    let report = driver.run().unwrap();
    let p = &report.passages[0];

    assert!(
        relative_error(p.initial_viable_density, 9.5e9) < 1e-12,
        "seeding density should be 0.95e6 cells / 0.1 mL: {:e}",
        p.initial_viable_density
    );
    assert!(
        relative_error(p.initial_dead_density, 5e8) < 1e-9,
        "dead seeding density: {:e}",
        p.initial_dead_density
    );
    assert!(
        p.multiplier > 1.3 && p.multiplier < 1.7,
        "16 h multiplier should be about 1.5, got {}",
        p.multiplier
    );
    assert!(p.final_dead_density > p.initial_dead_density);
    assert!(
        p.stats.accepted_steps > 10,
        "expected an adaptive trajectory, got {} steps",
        p.stats.accepted_steps
    );
}

// ============================================================================
// Full train
// ============================================================================

#[test]
fn test_full_train_report() {
    let report = run_default();
    assert_eq!(report.passages.len(), 5);

    let process = ProcessParameters::default();
    assert_eq!(report.total_elapsed_h, process.total_duration_h());
    assert_eq!(report.total_elapsed_h, 252.0);
    assert!((report.total_elapsed_days() - 252.0 / 24.0).abs() < 1e-12);

    let mut clock = 0.0;
    for p in &report.passages {
        assert_eq!(p.start_time_h, clock, "passage {} seeded off-clock", p.index);
        assert!(p.end_time_h() > p.start_time_h);
        clock = p.end_time_h();
        assert!(p.multiplier > 1.0, "passage {} should grow", p.index);
    }
    assert_eq!(clock, report.total_elapsed_h);

    assert!(
        !report.target_reached,
        "documented train falls short of 2.16e12 cells"
    );
    assert!(
        report.final_cell_count > 5e8 && report.final_cell_count < 2e9,
        "final count should be about 1e9, got {:e}",
        report.final_cell_count
    );
    assert_eq!(report.peak_viable_time_h, 80.0);
}

#[test]
fn test_dilution_conserves_cells() {
    let report = run_default();
    for pair in report.passages.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let carried = next.initial_viable_density * next.volume_L;
        assert!(
            relative_error(carried, prev.total_cell_count) < 1e-12,
            "viable cells lost between passages {} and {}",
            prev.index,
            next.index
        );
        let dead_before = prev.final_dead_density * prev.volume_L;
        let dead_after = next.initial_dead_density * next.volume_L;
        assert!(relative_error(dead_after, dead_before) < 1e-12);
    }

    let counts = report.cell_counts();
    assert_eq!(counts.len(), 6);
    assert_eq!(counts[0], 1e6);
    assert_eq!(counts[5], report.final_cell_count);
    assert_eq!(
        dilute(4.0, 1.0, 5.0) * 5.0,
        4.0,
        "dilution keeps density × volume"
    );
}

#[test]
fn test_chart_series_on_culture_clock() {
    let report = run_default();
    let series = report.chart_series();
    assert_eq!(series.len(), 5);
    for (s, p) in series.iter().zip(&report.passages) {
        assert_eq!(s.label, format!("passage {}", p.index + 1));
        assert_eq!(s.times_h.len(), s.viable_cells_per_L.len());
        assert_eq!(s.times_h[0], p.start_time_h);
        assert!((s.times_h.last().unwrap() - p.end_time_h()).abs() < 1e-9);
        assert_eq!(s.viable_cells_per_L[0], p.initial_viable_density);
    }
}

#[test]
fn test_negative_samples_reported_under_warn() {
    let report = run_default();
    let flagged: usize = report.passages.iter().map(|p| p.negative_samples).sum();
    assert!(
        flagged > 0,
        "glutamine depletion should drive the balance negative"
    );
}

#[test]
fn test_loose_tolerances_keep_glutamine_bounded() {
    let process = ProcessParameters {
        solver: IntegratorConfig {
            relative_tolerance: 1e-3,
            absolute_tolerance: 1e-3,
            max_step_h: 1.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let driver = PassageDriver::new(KineticParameters::default(), process).unwrap();
    let loose = driver.run().expect("loose tolerances should still complete");

    let min_glutamine = loose
        .passages
        .iter()
        .flat_map(|p| p.trajectory.states.iter())
        .map(|s| s.glutamine_mM)
        .fold(f64::INFINITY, f64::min);
    assert!(
        min_glutamine > -20.0,
        "exhausted glutamine should drift slowly, reached {} mM",
        min_glutamine
    );
    let min_ammonia = loose
        .passages
        .iter()
        .flat_map(|p| p.trajectory.states.iter())
        .map(|s| s.ammonia_mM)
        .fold(f64::INFINITY, f64::min);
    assert!(min_ammonia > 0.0, "ammonia went non-positive: {}", min_ammonia);

    let reference = run_default();
    assert!(
        relative_error(loose.final_cell_count, reference.final_cell_count) < 0.05,
        "loose run {:e} drifted from default run {:e}",
        loose.final_cell_count,
        reference.final_cell_count
    );
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_abort_policy_stops_on_depletion() {
    let process = ProcessParameters {
        negativity_policy: NegativityPolicy::Abort,
        ..Default::default()
    };
    let driver = PassageDriver::new(KineticParameters::default(), process).unwrap();
    match driver.run() {
        Err(SimulationError::NegativeConcentration {
            passage,
            species,
            value_mM,
            t_h,
        }) => {
            assert_eq!(passage, 0);
            assert_eq!(species, "GLN");
            let err = SimulationError::NegativeConcentration {
                passage,
                species,
                value_mM,
                t_h,
            };
            assert!(
                err.to_string().starts_with("passage 1: GLN"),
                "messages number passages from 1: {}",
                err
            );
            assert!(value_mM < 0.0);
            assert!(t_h > 0.0 && t_h < 16.0);
        }
        other => panic!("expected NegativeConcentration, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_empty_train_rejected() {
    let process = ProcessParameters {
        passages: Vec::new(),
        ..Default::default()
    };
    assert!(matches!(
        PassageDriver::new(KineticParameters::default(), process),
        Err(ConfigError::EmptyTrain)
    ));
}

#[test]
fn test_invalid_vessel_rejected() {
    let mut process = ProcessParameters::default();
    process.passages[2].volume_L = -5e-3;
    match PassageDriver::new(KineticParameters::default(), process) {
        Err(err @ ConfigError::InvalidVolume { .. }) => {
            assert!(
                err.to_string().starts_with("passage 3:"),
                "third vessel is reported as passage 3: {}",
                err
            );
            if let ConfigError::InvalidVolume { index, value } = err {
                assert_eq!(index, 2);
                assert_eq!(value, -5e-3);
            }
        }
        other => panic!("expected InvalidVolume, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_zero_ammonia_baseline_rejected() {
    let mut process = ProcessParameters::default();
    process.medium.ammonia_mM = 0.0;
    assert!(matches!(
        PassageDriver::new(KineticParameters::default(), process),
        Err(ConfigError::AmmoniaBaseline(_))
    ));
}
