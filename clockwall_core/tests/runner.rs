//! Event handling order of the clock loop, driven step by step on a manual clock.

use std::sync::Arc;
use std::time::Duration;

use clockwall_config::{MemoryStore, Settings};
use clockwall_core::mocks::{BrokenDisplay, Journal, RecordingDisplay, RecordingTrigger};
use clockwall_core::{
    CalibrationOutcome, CalibrationPolicy, CalibrationReason, ClockError, ClockRunner, ControlEvent,
    Flow,
};
use clockwall_traits::ManualClock;
use crossbeam_channel as xch;

// 2025-01-01T14:05:09.250Z
const T0: f64 = 1_735_740_309_250.0;

fn utc() -> Settings {
    Settings {
        utc_offset_hours: 0.0,
        ..Settings::default()
    }
}

fn outcome(previous: f64, offset: f64, applied: bool) -> CalibrationOutcome {
    CalibrationOutcome {
        previous_offset_ms: previous,
        offset_ms: offset,
        samples: vec![],
        applied,
    }
}

struct Rig {
    clock: ManualClock,
    journal: Journal,
    display: RecordingDisplay,
    runner: ClockRunner,
}

fn rig_with_trigger() -> Rig {
    let clock = ManualClock::at_wall_ms(T0);
    let journal = Journal::new();
    let display = RecordingDisplay::with_journal(journal.clone());
    let runner = ClockRunner::builder()
        .with_clock(Arc::new(clock.clone()))
        .with_settings(utc())
        .with_trigger(RecordingTrigger::new(journal.clone()))
        .with_display(display.clone())
        .build()
        .expect("build");
    Rig {
        clock,
        journal,
        display,
        runner,
    }
}

/// Started and past the startup calibration.
fn running_rig() -> Rig {
    let mut rig = rig_with_trigger();
    rig.runner.start().expect("start");
    rig.runner
        .handle(ControlEvent::Calibrated(outcome(0.0, 0.0, true), CalibrationReason::Startup))
        .expect("startup outcome");
    rig.journal.clear();
    rig
}

#[test]
fn startup_calibrates_then_renders_then_arms() {
    let mut rig = rig_with_trigger();
    rig.runner.start().expect("start");
    assert_eq!(rig.journal.entries(), ["calibrate:startup"]);
    assert!(!rig.runner.scheduler().is_running());
    assert_eq!(rig.display.count(), 0);

    rig.runner
        .handle(ControlEvent::Calibrated(outcome(0.0, 0.0, false), CalibrationReason::Startup))
        .expect("outcome");
    assert_eq!(rig.journal.entries(), ["calibrate:startup", "render"]);
    assert!(rig.runner.scheduler().is_running());
    assert_eq!(
        rig.runner.scheduler().time_until_due(rig.clock_now()),
        Some(Duration::from_millis(750))
    );
}

#[test]
fn resume_renders_then_calibrates_then_rearms() {
    let mut rig = running_rig();
    rig.runner.handle(ControlEvent::Visibility(false)).expect("hide");
    assert!(!rig.runner.scheduler().is_running());
    assert!(rig.journal.entries().is_empty());

    rig.clock.advance(Duration::from_secs(30));
    rig.runner.handle(ControlEvent::Visibility(true)).expect("show");
    assert_eq!(rig.journal.entries(), ["render", "calibrate:resume"]);
    assert!(!rig.runner.scheduler().is_running());

    // A failed pass still re-arms
    rig.runner
        .handle(ControlEvent::Calibrated(outcome(0.0, 0.0, false), CalibrationReason::Resume(1)))
        .expect("resume outcome");
    assert!(rig.runner.scheduler().is_running());
    let frames = rig.display.frames();
    assert_eq!(frames.last().map(|(f, _)| f.time.digits), Some([1, 4, 0, 5, 3, 9]));
}

#[test]
fn late_outcome_from_an_earlier_resume_does_not_rearm() {
    let mut rig = running_rig();
    for _ in 0..2 {
        rig.runner.handle(ControlEvent::Visibility(false)).expect("hide");
        rig.runner.handle(ControlEvent::Visibility(true)).expect("show");
    }
    assert_eq!(
        rig.journal.entries(),
        ["render", "calibrate:resume", "render", "calibrate:resume"]
    );

    // Outcome of the first resume arrives after the second one was requested
    rig.runner
        .handle(ControlEvent::Calibrated(outcome(0.0, 0.0, true), CalibrationReason::Resume(1)))
        .expect("stale outcome");
    assert!(
        !rig.runner.scheduler().is_running(),
        "re-armed before the current resume calibration finished"
    );

    // Neither may a drifting periodic pass
    rig.runner
        .handle(ControlEvent::Calibrated(outcome(0.0, 900.0, true), CalibrationReason::Periodic))
        .expect("periodic");
    assert!(!rig.runner.scheduler().is_running());

    rig.runner
        .handle(ControlEvent::Calibrated(outcome(900.0, 900.0, true), CalibrationReason::Resume(2)))
        .expect("current outcome");
    assert!(rig.runner.scheduler().is_running());
}

#[test]
fn hidden_clock_does_not_tick() {
    let mut rig = running_rig();
    rig.runner.handle(ControlEvent::Visibility(false)).expect("hide");
    rig.clock.advance(Duration::from_secs(5));
    assert_eq!(rig.runner.on_timer().expect("timer"), Flow::Continue);
    assert_eq!(rig.display.count(), 1);

    // Periodic passes while hidden never arm
    rig.runner
        .handle(ControlEvent::Calibrated(outcome(0.0, 900.0, true), CalibrationReason::Periodic))
        .expect("periodic");
    assert!(!rig.runner.scheduler().is_running());
}

#[test]
fn periodic_drift_rearms_only_past_threshold() {
    let mut rig = running_rig();
    let rearms = rig.runner.stats().rearms;

    rig.runner
        .handle(ControlEvent::Calibrated(outcome(10.0, 14.0, true), CalibrationReason::Periodic))
        .expect("small drift");
    assert_eq!(rig.runner.stats().rearms, rearms);

    rig.runner
        .handle(ControlEvent::Calibrated(outcome(14.0, 19.0, true), CalibrationReason::Periodic))
        .expect("threshold drift");
    assert_eq!(rig.runner.stats().rearms, rearms + 1);
    assert_eq!(rig.runner.stats().calibrations, 3);
}

#[test]
fn format_changes_render_rearm_and_persist() {
    let clock = ManualClock::at_wall_ms(T0);
    let store = MemoryStore::new();
    let display = RecordingDisplay::new();
    let mut runner = ClockRunner::builder()
        .with_clock(Arc::new(clock.clone()))
        .with_settings(utc())
        .with_store(store.clone())
        .with_display(display.clone())
        .build()
        .expect("build");
    runner.start().expect("start");
    assert_eq!(display.count(), 1);

    runner.handle(ControlEvent::ToggleTwelveHour).expect("toggle");
    assert_eq!(display.count(), 2);
    let (frame, settings) = display.frames().pop().expect("frame");
    assert!(settings.twelve_hour);
    assert_eq!(frame.time.digits[..2], [0, 2]);
    assert_eq!(store.current().map(|s| s.twelve_hour), Some(true));

    runner.handle(ControlEvent::SetUtcOffset(5.5)).expect("offset");
    let (frame, _) = display.frames().pop().expect("frame");
    assert_eq!(frame.time.digits, [0, 7, 3, 5, 0, 9]);
    assert_eq!(store.current().map(|s| s.utc_offset_hours), Some(5.5));

    runner.handle(ControlEvent::SetUtcOffset(99.0)).expect("ignored");
    assert_eq!(runner.settings().utc_offset_hours, 5.5);

    runner.handle(ControlEvent::SetTheme("  Neon ".into())).expect("theme");
    runner.handle(ControlEvent::SetUiHidden(true)).expect("ui");
    assert_eq!(runner.settings().theme, "Neon");
    assert_eq!(store.writes(), 4);
    assert_eq!(runner.stats().rearms, 3);
}

#[test]
fn missing_worker_falls_back_to_immediate_start() {
    let clock = ManualClock::at_wall_ms(T0);
    let journal = Journal::new();
    let mut runner = ClockRunner::builder()
        .with_clock(Arc::new(clock))
        .with_trigger(RecordingTrigger::closed(journal.clone()))
        .with_display(RecordingDisplay::with_journal(journal.clone()))
        .build()
        .expect("build");
    runner.start().expect("start");
    assert_eq!(journal.entries(), ["calibrate:startup", "render"]);
    assert!(runner.scheduler().is_running());
}

#[test]
fn scripted_run_ticks_on_whole_seconds() {
    let clock = ManualClock::at_wall_ms(T0);
    let display = RecordingDisplay::new();
    let runner = ClockRunner::builder()
        .with_clock(Arc::new(clock.clone()))
        .with_settings(utc())
        .with_max_ticks(3)
        .with_display(display.clone())
        .build()
        .expect("build");

    let (tx, rx) = xch::unbounded();
    tx.send(ControlEvent::SetTwelveHour(false)).expect("send");
    drop(tx);
    let stats = runner.run(&rx).expect("run");

    assert_eq!(stats.ticks, 3);
    assert_eq!(stats.missed_ticks, 0);
    let seconds: Vec<f64> = display
        .frames()
        .iter()
        .map(|(f, _)| f.corrected_ms.rem_euclid(1000.0))
        .collect();
    // startup render, re-render on the format event, then three aligned ticks
    assert_eq!(seconds, [250.0, 250.0, 0.0, 0.0, 0.0]);
    let last = display.frames().pop().expect("frame").0;
    assert_eq!(last.time.digits, [1, 4, 0, 5, 1, 2]);
}

#[test]
fn shutdown_event_stops_the_loop() {
    let clock = ManualClock::at_wall_ms(T0);
    let runner = ClockRunner::builder()
        .with_clock(Arc::new(clock))
        .with_display(RecordingDisplay::new())
        .build()
        .expect("build");
    let (tx, rx) = xch::unbounded();
    tx.send(ControlEvent::Shutdown).expect("send");
    let stats = runner.run(&rx).expect("run");
    assert_eq!(stats.ticks, 0);
    assert_eq!(stats.renders, 1);
}

#[test]
fn display_failure_is_a_typed_error() {
    let mut runner = ClockRunner::builder()
        .with_clock(Arc::new(ManualClock::at_wall_ms(T0)))
        .with_display(BrokenDisplay)
        .build()
        .expect("build");
    let err = runner.start().expect_err("broken pipe");
    assert!(matches!(err.downcast_ref::<ClockError>(), Some(ClockError::Display(_))));
}

#[test]
fn negative_threshold_is_rejected() {
    let err = ClockRunner::builder()
        .with_policy(CalibrationPolicy {
            reschedule_threshold_ms: -1.0,
            ..CalibrationPolicy::default()
        })
        .with_display(RecordingDisplay::new())
        .build()
        .expect_err("invalid");
    assert!(err.to_string().contains("reschedule_threshold_ms"));
}

impl Rig {
    fn clock_now(&self) -> std::time::Instant {
        use clockwall_traits::Clock;
        self.clock.now()
    }
}
