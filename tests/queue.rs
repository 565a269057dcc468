use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fanout::{PushError, Queue};

#[test]
fn multi_producer_single_consumer_delivers_every_value() {
    let q = Arc::new(Queue::new());
    let producers: Vec<_> = (0..4)
        .map(|p| {
            let q = q.clone();
            thread::spawn(move || {
                for i in 0..250 {
                    q.push(p * 250 + i).unwrap();
                }
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    q.close(None);

    let mut received = Vec::new();
    while let Some(v) = q.poll() {
        received.push(v);
    }
    received.sort_unstable();
    assert_eq!(received, (0..1000).collect::<Vec<_>>());
}

#[test]
fn close_none_returns_immediately_and_keeps_draining() {
    let q = Queue::new();
    for i in 0..10 {
        q.push(i).unwrap();
    }

    let start = std::time::Instant::now();
    q.close(None);
    assert!(start.elapsed() < Duration::from_millis(50));

    for i in 0..10 {
        assert_eq!(q.poll(), Some(i));
    }
    assert_eq!(q.poll(), None);
}

#[test]
fn push_error_carries_the_rejected_value_back() {
    let q = Queue::new();
    q.close(None);

    match q.push(42) {
        Err(PushError(v)) => assert_eq!(v, 42),
        Ok(()) => panic!("push should have been rejected"),
    }
}

#[test]
fn dropping_without_close_still_joins_the_coordinator() {
    let before = fanout::active_worker_threads();
    {
        let q = Queue::<i32>::new();
        q.push(1).unwrap();
        assert_eq!(fanout::active_worker_threads(), before + 1);
    }
    assert_eq!(fanout::active_worker_threads(), before);
}
