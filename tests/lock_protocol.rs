mod common;

use common::memory_client;
use sdb_lock::store::Attribute;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn abc_lifecycle() {
    let client = memory_client();

    assert_eq!(client.locked_time("abc").unwrap(), None);
    assert!(client.try_lock("abc", &[]).unwrap());
    assert!(client.locked_time("abc").unwrap().is_some());
    assert!(!client.try_lock("abc", &[]).unwrap());

    assert!(client.unlock("abc").unwrap());
    assert_eq!(client.locked_time("abc").unwrap(), None);

    let stale = client.locked_resources(Some(Duration::ZERO)).unwrap();
    assert!(!stale.contains(&"abc".to_string()));
}

#[test]
fn only_one_concurrent_try_lock_wins() {
    let client = memory_client();
    let contenders = 10;
    let barrier = Arc::new(Barrier::new(contenders));

    let handles: Vec<_> = (0..contenders)
        .map(|_| {
            let client = client.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                client.try_lock("shared", &[]).unwrap()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
    assert!(client.locked_time("shared").unwrap().is_some());
}

#[test]
fn concurrent_lock_with_runs_every_block_exclusively() {
    let client = memory_client();
    let workers = 10;
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let client = client.clone();
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                client
                    .lock_with("critical", &[], || {
                        let now_inside = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now_inside, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(3));
                        inside.fetch_sub(1, Ordering::SeqCst);
                        finished.fetch_add(1, Ordering::SeqCst)
                    })
                    .unwrap()
            })
        })
        .collect();

    let mut results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    results.sort_unstable();

    assert_eq!(finished.load(Ordering::SeqCst), workers);
    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    assert_eq!(results, (0..workers).collect::<Vec<_>>());
    assert_eq!(client.locked_time("critical").unwrap(), None);
}

#[test]
fn extra_attributes_follow_the_lease() {
    let client = memory_client();
    let extra = [
        Attribute::new("owner", "host-a"),
        Attribute::new("pid", "4242"),
    ];

    assert!(client.try_lock("job", &extra).unwrap());
    let locked = client.locked_resources(None).unwrap();
    assert_eq!(locked, vec!["job".to_string()]);

    assert!(client.unlock("job").unwrap());
    assert!(client.locked_resources(None).unwrap().is_empty());
    // The whole item is gone, so a new lease starts without the old extras.
    assert!(client.try_lock("job", &[]).unwrap());
}

#[test]
fn unlock_is_idempotent() {
    let client = memory_client();
    assert!(client.unlock("never").unwrap());
    assert!(client.unlock("never").unwrap());

    assert!(client.try_lock("once", &[]).unwrap());
    assert!(client.unlock("once").unwrap());
    assert!(client.unlock("once").unwrap());
}

#[test]
fn guard_releases_at_scope_end() {
    let client = memory_client();
    {
        let guard = client.acquire("scoped", &[]).unwrap();
        assert_eq!(guard.resource(), "scoped");
        assert!(!client.try_lock("scoped", &[]).unwrap());
    }
    assert!(client.try_lock("scoped", &[]).unwrap());
}

#[test]
fn blocked_lock_acquires_after_holder_finishes() {
    let client = memory_client();
    let holder = client.try_acquire("handoff", &[]).unwrap().unwrap();

    let waiter = {
        let client = client.clone();
        thread::spawn(move || client.lock_with("handoff", &[], || "ran").unwrap())
    };

    thread::sleep(Duration::from_millis(20));
    assert!(!waiter.is_finished());
    assert!(holder.release().unwrap());
    assert_eq!(waiter.join().unwrap(), "ran");
}
