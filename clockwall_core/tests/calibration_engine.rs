//! Calibration passes against scripted time sources on a manual clock.

use std::sync::Arc;
use std::time::Duration;

use clockwall_core::calibration::{BoxedSource, CalibrationEngine, CalibrationState, sample_source};
use clockwall_core::mocks::{FailingSource, ScriptedSource};
use clockwall_core::SourceFailureKind;
use clockwall_traits::ManualClock;
use rstest::rstest;

// 2025-01-01T14:05:09Z
const T0: f64 = 1_735_740_309_000.0;

fn engine(sources: Vec<BoxedSource>, clock: &ManualClock, initial: f64) -> CalibrationEngine<ManualClock> {
    CalibrationEngine::new(sources, CalibrationState::shared(initial), clock.clone())
}

#[test]
fn smallest_absolute_offset_is_selected() {
    let clock = ManualClock::at_wall_ms(T0);
    let mut e = engine(
        vec![
            Box::new(ScriptedSource::new("a", clock.clone(), 1500.0).with_latency(Duration::from_millis(40))),
            Box::new(ScriptedSource::new("b", clock.clone(), -200.0).with_latency(Duration::from_millis(80))),
        ],
        &clock,
        0.0,
    );
    let offset = e.calibrate();
    assert!((offset + 200.0).abs() < 1e-6, "got {offset}");
    assert!((e.state().offset_ms() + 200.0).abs() < 1e-6);
    assert!(e.state().last_updated_at().is_some());
}

#[test]
fn all_sources_failing_keeps_previous_offset() {
    let clock = ManualClock::at_wall_ms(T0);
    let mut e = engine(
        vec![
            Box::new(FailingSource::new("a", "connection refused")),
            Box::new(FailingSource::new("b", "operation timed out")),
        ],
        &clock,
        42.0,
    );
    let outcome = e.calibrate_detailed();
    assert!(!outcome.applied);
    assert_eq!(outcome.offset_ms, 42.0);
    assert_eq!(outcome.drift_ms(), 0.0);
    assert!(!outcome.needs_reschedule(0.0));
    assert_eq!(e.state().offset_ms(), 42.0);
    assert_eq!(e.state().last_updated_at(), None);
    assert_eq!(e.calibrate(), 42.0);

    let kinds: Vec<_> = outcome.samples.iter().map(|s| s.failure).collect();
    assert_eq!(kinds, vec![Some(SourceFailureKind::Network), Some(SourceFailureKind::Timeout)]);
}

#[test]
fn one_failure_does_not_abort_the_pass() {
    let clock = ManualClock::at_wall_ms(T0);
    let mut e = engine(
        vec![
            Box::new(FailingSource::new("a", "response has no Date header timestamp")),
            Box::new(ScriptedSource::new("b", clock.clone(), 900.0)),
        ],
        &clock,
        0.0,
    );
    let outcome = e.calibrate_detailed();
    assert!(outcome.applied);
    assert_eq!(outcome.succeeded(), 1);
    assert_eq!(outcome.samples[0].failure, Some(SourceFailureKind::MissingTimestamp));
    assert!((outcome.offset_ms - 900.0).abs() < 1e-6);
    assert!(outcome.needs_reschedule(5.0));
}

#[rstest]
#[case(0, 0.0)]
#[case(200, 0.0)]
#[case(200, -350.0)]
#[case(1_000, 2_500.0)]
fn half_round_trip_is_compensated(#[case] latency_ms: u64, #[case] skew_ms: f64) {
    let clock = ManualClock::at_wall_ms(T0);
    let mut src = ScriptedSource::new("s", clock.clone(), skew_ms)
        .with_latency(Duration::from_millis(latency_ms));
    let sample = sample_source(&mut src, &clock, Duration::from_secs(5));
    assert!(sample.succeeded);
    assert!((sample.round_trip_ms - latency_ms as f64).abs() < 1e-6);
    assert!(
        (sample.raw_offset_ms - skew_ms).abs() < 1e-3,
        "latency {latency_ms}: got {}",
        sample.raw_offset_ms
    );
}

#[test]
fn readers_see_committed_offset() {
    let clock = ManualClock::at_wall_ms(T0);
    let state = Arc::new(CalibrationState::new(0.0));
    let reader = Arc::clone(&state);
    let mut e = CalibrationEngine::new(
        vec![Box::new(ScriptedSource::new("a", clock.clone(), 250.0))],
        state,
        clock.clone(),
    );
    e.calibrate();
    assert!((reader.corrected_now_ms(&clock) - (T0 + 250.0)).abs() < 1e-3);
}

#[test]
fn timestamp_never_runs_ahead_of_offset() {
    // Commit i is (offset = i, at = i); a reader that sees timestamp t must
    // see an offset from commit t or later.
    const COMMITS: i64 = 20_000;
    let state = CalibrationState::shared(0.0);
    let writer_state = Arc::clone(&state);
    let writer = std::thread::spawn(move || {
        for i in 1..=COMMITS {
            writer_state.commit(i as f64, i as f64);
        }
    });

    let mut observed = 0;
    while observed < COMMITS {
        if let Some(at) = state.last_updated_at() {
            let offset = state.offset_ms();
            assert!(offset >= at as f64, "timestamp {at} published before offset {offset}");
            observed = at;
        }
    }
    writer.join().unwrap();
}

#[test]
fn failed_samples_carry_the_classified_kind() {
    let clock = ManualClock::at_wall_ms(T0);
    let mut src = FailingSource::new("dead", "request timed out");
    let sample = sample_source(&mut src, &clock, Duration::from_secs(1));
    assert!(!sample.succeeded);
    assert_eq!(sample.failure, Some(SourceFailureKind::Timeout));
    assert_eq!(sample.source_id, "dead");
}
