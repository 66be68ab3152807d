//! Concurrent correctness tests shared by all feed variants.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use crate::feed::Feed;

/// Concurrent adds from several threads: nothing is lost and the order
/// invariant holds afterwards.
pub fn test_concurrent_adds<F>()
where
    F: Feed + Default + 'static,
{
    let feed = Arc::new(F::default());
    let num_threads = 8;
    let posts_per_thread = 200;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let feed = Arc::clone(&feed);
            thread::spawn(move || {
                for i in 0..posts_per_thread {
                    let ts = (thread_id * posts_per_thread + i) as f64;
                    feed.add(format!("t{thread_id}-{i}"), ts);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = feed.snapshot();
    assert_eq!(snapshot.len(), num_threads * posts_per_thread);
    for pair in snapshot.windows(2) {
        assert!(
            pair[0].timestamp >= pair[1].timestamp,
            "order violated: {} before {}",
            pair[0].timestamp,
            pair[1].timestamp
        );
    }

    for i in 0..(num_threads * posts_per_thread) {
        assert!(feed.contains(i as f64), "missing timestamp: {i}");
    }
}

/// Two threads race to add posts with the same timestamp onto an empty
/// feed; both must land, in either order.
pub fn test_concurrent_adds_same_timestamp<F>()
where
    F: Feed + Default + 'static,
{
    for _ in 0..50 {
        let feed = Arc::new(F::default());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["p", "q"]
            .into_iter()
            .map(|body| {
                let feed = Arc::clone(&feed);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    feed.add(body.to_string(), 5.0);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|p| p.timestamp == 5.0));
        let mut bodies: Vec<String> = snapshot.into_iter().map(|p| p.body).collect();
        bodies.sort();
        assert_eq!(bodies, vec!["p".to_string(), "q".to_string()]);
    }
}

/// Many threads race to remove the same timestamp; exactly one wins.
pub fn test_concurrent_remove_same_timestamp<F>()
where
    F: Feed + Default + 'static,
{
    let feed = Arc::new(F::default());
    let num_threads = 32;

    feed.add("victim".to_string(), 42.0);

    let success_count = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let feed = Arc::clone(&feed);
            let success = Arc::clone(&success_count);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if feed.remove(42.0) {
                    success.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(success_count.load(Ordering::Relaxed), 1);
    assert!(!feed.contains(42.0));
}

/// Mixed adds and removes under contention; the survivors must be exactly
/// the posts nobody removed, in order.
pub fn test_concurrent_mixed_operations<F>()
where
    F: Feed + Default + 'static,
{
    let feed = Arc::new(F::default());
    let num_threads = 6;
    let ops_per_thread = 300;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let feed = Arc::clone(&feed);
            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let ts = (thread_id * ops_per_thread + i) as f64;
                    feed.add(format!("t{thread_id}-{i}"), ts);

                    // Every third post is removed again by its writer.
                    if i % 3 == 0 {
                        assert!(feed.remove(ts));
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = feed.snapshot();
    for pair in snapshot.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }

    for thread_id in 0..num_threads {
        for i in 0..ops_per_thread {
            let ts = (thread_id * ops_per_thread + i) as f64;
            assert_eq!(feed.contains(ts), i % 3 != 0, "timestamp {ts}");
        }
    }
}

/// Snapshots taken while writers are active always observe a sorted feed.
pub fn test_snapshot_during_modifications<F>()
where
    F: Feed + Default + 'static,
{
    let feed = Arc::new(F::default());
    let num_writers = 4;
    let posts_per_writer = 250;

    let mut handles = Vec::new();

    for thread_id in 0..num_writers {
        let feed = Arc::clone(&feed);
        handles.push(thread::spawn(move || {
            for i in 0..posts_per_writer {
                // Interleaved timestamps so writers collide on positions.
                let ts = (i * num_writers + thread_id) as f64;
                feed.add(format!("t{thread_id}-{i}"), ts);
                if i % 5 == 0 {
                    feed.remove(ts);
                }
            }
        }));
    }

    for _ in 0..2 {
        let feed = Arc::clone(&feed);
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                let snapshot = feed.snapshot();
                for pair in snapshot.windows(2) {
                    assert!(
                        pair[0].timestamp >= pair[1].timestamp,
                        "snapshot observed out-of-order feed"
                    );
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}
