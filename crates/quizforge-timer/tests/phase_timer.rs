//! Integration tests for the phase timer.
//!
//! Uses `start_paused = true` so Tokio's clock only moves when every task
//! is idle, which makes deadlines exact.

use std::time::Duration;

use quizforge_timer::PhaseTimer;
use tokio::time::Instant;

const PHASE: Duration = Duration::from_millis(12_500);

#[test]
fn test_new_timer_is_disarmed() {
    let timer = PhaseTimer::new();
    assert!(!timer.is_armed());
    assert_eq!(timer.phase(), 0);
    assert_eq!(timer.fired_count(), 0);
    assert_eq!(timer.remaining(), None);
}

#[tokio::test(start_paused = true)]
async fn test_fires_after_armed_duration() {
    let mut timer = PhaseTimer::new();
    let start = Instant::now();
    assert_eq!(timer.arm(PHASE), 1);

    let fired = timer.expired().await;

    assert_eq!(start.elapsed(), PHASE);
    assert_eq!(fired.phase, 1);
    assert!(!fired.overrun);
    assert!(!timer.is_armed(), "one-shot: disarmed after firing");
    assert_eq!(timer.fired_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disarmed_timer_never_fires() {
    let mut timer = PhaseTimer::new();
    let result =
        tokio::time::timeout(Duration::from_secs(3600), timer.expired()).await;
    assert!(result.is_err(), "disarmed timer should pend forever");
}

#[tokio::test(start_paused = true)]
async fn test_cancel_prevents_fire() {
    let mut timer = PhaseTimer::new();
    timer.arm(PHASE);
    timer.cancel();
    timer.cancel();

    assert!(!timer.is_armed());
    let result = tokio::time::timeout(PHASE * 2, timer.expired()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_rearm_replaces_previous_deadline() {
    let mut timer = PhaseTimer::new();
    timer.arm(PHASE);
    tokio::time::advance(Duration::from_secs(10)).await;

    let start = Instant::now();
    assert_eq!(timer.arm(PHASE), 2);
    let fired = timer.expired().await;

    // Measured from the re-arm, not from the first arm.
    assert_eq!(start.elapsed(), PHASE);
    assert_eq!(fired.phase, 2);
    assert_eq!(timer.fired_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_wait_keeps_deadline() {
    let mut timer = PhaseTimer::new();
    timer.arm(PHASE);

    let early =
        tokio::time::timeout(Duration::from_secs(1), timer.expired()).await;
    assert!(early.is_err());
    assert!(timer.is_armed());
    assert_eq!(timer.remaining(), Some(PHASE - Duration::from_secs(1)));

    let fired = timer.expired().await;
    assert_eq!(fired.phase, 1);
}

#[tokio::test(start_paused = true)]
async fn test_late_wakeup_reports_overrun() {
    let mut timer = PhaseTimer::with_late_threshold(Duration::from_millis(10));
    timer.arm(Duration::from_millis(100));

    // Move the clock well past the deadline before anyone polls.
    tokio::time::advance(Duration::from_millis(400)).await;
    let fired = timer.expired().await;

    assert!(fired.overrun);
    assert_eq!(fired.late_by, Duration::from_millis(300));
}
