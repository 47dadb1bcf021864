//! Integration tests for the persistence scheduler.
//!
//! Uses `start_paused = true` so Tokio's clock only moves when every task
//! is idle. A `sleep` in the test body then jumps straight past the
//! scheduler's timers, deterministically.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use wordforge_persist::{PersistConfig, PersistenceScheduler, SaveFn};
use wordforge_protocol::SessionId;
use wordforge_store::StoreError;

// =========================================================================
// Helpers
// =========================================================================

const SESSION: SessionId = SessionId(1);

fn scheduler() -> PersistenceScheduler {
    PersistenceScheduler::new(PersistConfig {
        inactivity_delay: Duration::from_secs(5),
        force_save_every: 3,
        max_retries: 2,
        retry_backoff: Duration::from_millis(100),
    })
}

/// A save callback that counts calls and fails the first `failures` times.
fn counting_save(failures: u32) -> (SaveFn, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let save: SaveFn = Arc::new(move || {
        let counter = Arc::clone(&counter);
        Box::pin(async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < failures {
                Err(StoreError::Unavailable(format!("attempt {n}")))
            } else {
                Ok(())
            }
        })
    });
    (save, calls)
}

// =========================================================================
// Debounce
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_inactivity_save_fires_after_delay() {
    let scheduler = scheduler();
    let (save, calls) = counting_save(0);

    scheduler.schedule_inactivity_save(SESSION, save);
    assert!(scheduler.is_pending(SESSION));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!scheduler.is_pending(SESSION));
}

#[tokio::test(start_paused = true)]
async fn test_reschedule_resets_timer_and_saves_once() {
    let scheduler = scheduler();
    let (save, calls) = counting_save(0);

    for _ in 0..4 {
        scheduler.schedule_inactivity_save(SESSION, Arc::clone(&save));
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sessions_have_independent_timers() {
    let scheduler = scheduler();
    let (save_a, calls_a) = counting_save(0);
    let (save_b, calls_b) = counting_save(0);

    scheduler.schedule_inactivity_save(SessionId(1), save_a);
    tokio::time::sleep(Duration::from_secs(3)).await;
    scheduler.schedule_inactivity_save(SessionId(2), save_b);
    assert_eq!(scheduler.pending_count(), 2);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(calls_a.load(Ordering::SeqCst), 1);
    assert_eq!(calls_b.load(Ordering::SeqCst), 0);
}

// =========================================================================
// Threshold
// =========================================================================

#[test]
fn test_should_force_save_every_nth_guess() {
    let scheduler = scheduler();

    let hits: Vec<bool> = (0..7)
        .map(|_| scheduler.should_force_save_on_guess_count(SESSION))
        .collect();

    assert_eq!(hits, [false, false, true, false, false, true, false]);
}

#[test]
fn test_guess_counters_are_per_session() {
    let scheduler = scheduler();
    scheduler.should_force_save_on_guess_count(SessionId(1));
    scheduler.should_force_save_on_guess_count(SessionId(1));

    assert!(!scheduler.should_force_save_on_guess_count(SessionId(2)));
    assert!(scheduler.should_force_save_on_guess_count(SessionId(1)));
}

// =========================================================================
// Forced save
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_force_save_cancels_timer_and_resets_counter() {
    let scheduler = scheduler();
    let (save, calls) = counting_save(0);
    scheduler.schedule_inactivity_save(SESSION, Arc::clone(&save));
    scheduler.should_force_save_on_guess_count(SESSION);
    scheduler.should_force_save_on_guess_count(SESSION);

    scheduler.force_save_and_cleanup(SESSION, save).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!scheduler.is_pending(SESSION));

    // The cancelled timer never fires.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Counter restarted from zero.
    assert!(!scheduler.should_force_save_on_guess_count(SESSION));
}

// =========================================================================
// Retries
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_save_is_retried_until_success() {
    let scheduler = scheduler();
    let (save, calls) = counting_save(2);

    let result = scheduler.force_save_and_cleanup(SESSION, save).await;

    assert!(result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_save_gives_up_after_max_retries() {
    let scheduler = scheduler();
    let (save, calls) = counting_save(u32::MAX);

    let result = scheduler.force_save_and_cleanup(SESSION, save).await;

    assert!(matches!(result, Err(StoreError::Unavailable(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_debounced_save_retries_in_background() {
    let scheduler = scheduler();
    let (save, calls) = counting_save(1);

    scheduler.schedule_inactivity_save(SESSION, save);
    tokio::time::sleep(Duration::from_secs(6)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
