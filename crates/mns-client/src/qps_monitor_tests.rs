//! Tests for the rate monitor.

use super::*;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_window_has_a_floor() {
    assert_eq!(QpsMonitor::new(0).window_secs(), MIN_WINDOW_SECS);
    assert_eq!(QpsMonitor::new(3).window_secs(), MIN_WINDOW_SECS);
    assert_eq!(QpsMonitor::new(12).window_secs(), 12);
}

#[tokio::test(start_paused = true)]
async fn test_idle_monitor_reports_zero() {
    let monitor = QpsMonitor::new(5);

    assert_eq!(monitor.rate(), 0);
}

/// Verify k pulses inside one window give floor(k / window).
#[tokio::test(start_paused = true)]
async fn test_rate_is_floor_of_count_over_window() {
    let monitor = QpsMonitor::new(5);

    for _ in 0..23 {
        monitor.pulse();
    }
    assert_eq!(monitor.rate(), 4);

    for _ in 0..2 {
        monitor.pulse();
    }
    assert_eq!(monitor.rate(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_pulses_across_seconds_within_window_accumulate() {
    let monitor = QpsMonitor::new(5);

    for _ in 0..10 {
        monitor.pulse();
    }
    tokio::time::advance(Duration::from_secs(2)).await;
    for _ in 0..5 {
        monitor.pulse();
    }

    assert_eq!(monitor.rate(), 3);
}

/// Verify a bucket is cleared once its second leaves the window.
#[tokio::test(start_paused = true)]
async fn test_old_buckets_roll_out() {
    let monitor = QpsMonitor::new(5);

    for _ in 0..10 {
        monitor.pulse();
    }
    tokio::time::advance(Duration::from_secs(2)).await;
    for _ in 0..5 {
        monitor.pulse();
    }

    // Second 5 reuses the bucket of second 0.
    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(monitor.rate(), 1);

    // Second 7 reuses the bucket of second 2.
    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(monitor.rate(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_long_idle_period_clears_everything() {
    let monitor = QpsMonitor::new(5);

    for _ in 0..100 {
        monitor.pulse();
    }
    assert_eq!(monitor.rate(), 20);

    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(monitor.rate(), 0);

    monitor.pulse();
    assert_eq!(monitor.rate(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_pulses_are_all_counted() {
    let monitor = Arc::new(QpsMonitor::new(5));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let monitor = monitor.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..250 {
                monitor.pulse();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(monitor.rate(), 200);
}
