use std::time::{Duration, Instant};

use clockwall_core::scheduler::{AlignedScheduler, Phase, TICK_PERIOD};

#[test]
fn rearming_cancels_the_pending_timer() {
    let t0 = Instant::now();
    let mut s = AlignedScheduler::new();
    s.arm(t0, 100.0); // due at t0 + 900ms
    let g1 = s.generation();

    // Re-armed 500ms later at a different corrected time: due at t0 + 500 + 200
    let d = s.arm(t0 + Duration::from_millis(500), 1_800.0);
    assert_eq!(d, Duration::from_millis(200));
    assert!(s.generation() > g1);

    // The first timer's deadline (t0 + 900) has passed, yet only one tick fires
    let tick = s.poll(t0 + Duration::from_millis(900)).expect("tick");
    assert!(tick.is_aligned());
    assert_eq!(tick.generation, s.generation());
    assert_eq!(s.poll(t0 + Duration::from_millis(950)), None);
    assert_eq!(
        s.phase(),
        Phase::Ticking {
            next: t0 + Duration::from_millis(700) + TICK_PERIOD
        }
    );
}

#[test]
fn rearming_while_ticking_restarts_alignment() {
    let t0 = Instant::now();
    let mut s = AlignedScheduler::new();
    s.arm(t0, 0.0);
    assert!(s.poll(t0 + TICK_PERIOD).is_some());
    assert!(matches!(s.phase(), Phase::Ticking { .. }));

    s.arm(t0 + Duration::from_millis(1_300), 2_300.0);
    assert!(matches!(s.phase(), Phase::Aligning { .. }));
    // The old recurring deadline at t0 + 2000 is gone; the new aligned one is t0 + 2000 too
    let tick = s.poll(t0 + Duration::from_millis(2_000)).expect("aligned");
    assert_eq!(tick.seq, 0);
}

#[test]
fn stopped_scheduler_never_ticks() {
    let t0 = Instant::now();
    let mut s = AlignedScheduler::new();
    assert_eq!(s.poll(t0 + Duration::from_secs(10)), None);
    assert_eq!(s.time_until_due(t0), None);

    s.arm(t0, 0.0);
    s.stop();
    assert!(!s.is_running());
    assert_eq!(s.poll(t0 + Duration::from_secs(10)), None);
    assert_eq!(s.time_until_due(t0), None);
}

#[test]
fn stop_is_idempotent() {
    let mut s = AlignedScheduler::new();
    s.arm(Instant::now(), 0.0);
    s.stop();
    let g = s.generation();
    s.stop();
    assert_eq!(s.generation(), g);
}
