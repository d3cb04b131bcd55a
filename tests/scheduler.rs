use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use lexicam::{CycleContext, DetectionScheduler};

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

#[test]
fn start_twice_is_a_no_op() {
    let mut scheduler = DetectionScheduler::new();
    assert!(scheduler
        .start(Duration::from_millis(20), |_| Ok(()), |_| {})
        .expect("start"));
    assert!(!scheduler
        .start(Duration::from_millis(20), |_| Ok(()), |_| {})
        .expect("second start"));
    assert!(scheduler.is_running());
    scheduler.stop();
    scheduler.stop();
    assert!(!scheduler.is_running());
}

#[test]
fn slow_cycles_never_overlap_and_excess_ticks_are_dropped() {
    let active = Arc::new(AtomicUsize::new(0));
    let max_active = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));

    let (a, m, c) = (Arc::clone(&active), Arc::clone(&max_active), Arc::clone(&calls));
    let mut scheduler = DetectionScheduler::new();
    scheduler
        .start(
            Duration::from_millis(5),
            move |_| {
                let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                m.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(30));
                a.fetch_sub(1, Ordering::SeqCst);
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            |_| {},
        )
        .expect("start");

    assert!(wait_until(Duration::from_secs(3), || calls.load(Ordering::SeqCst) >= 3));
    scheduler.stop();

    assert_eq!(max_active.load(Ordering::SeqCst), 1);
    let stats = scheduler.stats();
    assert!(stats.skipped_busy > 0, "{:?}", stats);
    assert!(stats.ticks >= stats.dispatched + stats.skipped_busy);
}

#[test]
fn failures_are_reported_and_scheduling_continues() {
    let calls = Arc::new(AtomicUsize::new(0));
    let reports = Arc::new(Mutex::new(Vec::<String>::new()));

    let c = Arc::clone(&calls);
    let r = Arc::clone(&reports);
    let mut scheduler = DetectionScheduler::new();
    scheduler
        .start(
            Duration::from_millis(5),
            move |_| {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n % 2 == 0 {
                    Err(anyhow!("detector rejected frame {}", n))
                } else {
                    Ok(())
                }
            },
            move |err| r.lock().unwrap().push(err.to_string()),
        )
        .expect("start");

    assert!(wait_until(Duration::from_secs(3), || calls.load(Ordering::SeqCst) >= 4));
    scheduler.stop();
    thread::sleep(Duration::from_millis(20));

    let reports = reports.lock().unwrap();
    assert!(reports.len() >= 2);
    assert_eq!(reports[0], "detector rejected frame 0");
    assert_eq!(scheduler.stats().failures as usize, reports.len());
    assert!(!scheduler.is_busy());
}

#[test]
fn in_flight_cycle_sees_stop_and_does_not_commit() {
    let committed = Arc::new(AtomicUsize::new(0));
    let started = Arc::new(AtomicUsize::new(0));

    let (s, c) = (Arc::clone(&started), Arc::clone(&committed));
    let mut scheduler = DetectionScheduler::new();
    scheduler
        .start(
            Duration::from_millis(5),
            move |ctx: &CycleContext| {
                s.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(80));
                if ctx.is_running() {
                    c.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            },
            |_| {},
        )
        .expect("start");

    assert!(wait_until(Duration::from_secs(3), || started.load(Ordering::SeqCst) >= 1));
    scheduler.stop();
    assert!(!scheduler.is_busy());

    thread::sleep(Duration::from_millis(150));
    assert_eq!(committed.load(Ordering::SeqCst), 0);
    assert_eq!(started.load(Ordering::SeqCst), 1);
}

#[test]
fn restart_after_stop_uses_fresh_state() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut scheduler = DetectionScheduler::new();
    for _ in 0..2 {
        let c = Arc::clone(&calls);
        assert!(scheduler
            .start(
                Duration::from_millis(5),
                move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
                |_| {},
            )
            .expect("start"));
        let before = calls.load(Ordering::SeqCst);
        assert!(wait_until(Duration::from_secs(3), || {
            calls.load(Ordering::SeqCst) > before
        }));
        scheduler.stop();
    }
}

#[test]
fn dropping_the_scheduler_stops_it() {
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let c = Arc::clone(&calls);
        let mut scheduler = DetectionScheduler::new();
        scheduler
            .start(
                Duration::from_millis(5),
                move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
                |_| {},
            )
            .expect("start");
        assert!(wait_until(Duration::from_secs(3), || calls.load(Ordering::SeqCst) >= 1));
    }
    thread::sleep(Duration::from_millis(20));
    let after_drop = calls.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(calls.load(Ordering::SeqCst), after_drop);
}
