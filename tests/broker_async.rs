use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use fanout::{AsyncBroker, Exact};

#[test]
fn fan_out_delivers_asynchronously_to_every_matching_subscriber() {
    let broker = AsyncBroker::new();
    let a = broker.subscribe(Exact::new("users"));
    let b = broker.subscribe(Exact::new("users"));

    assert_eq!(broker.publish("users", "alice"), 2);

    // `poll` blocks until the dispatcher thread has performed the fan-out;
    // no sleep needed to win the race.
    assert_eq!(a.poll(), Some("alice"));
    assert_eq!(b.poll(), Some("alice"));

    broker.close(Some(Duration::from_millis(200)));
}

#[test]
fn publish_with_no_subscribers_enqueues_nothing_and_returns_zero() {
    let broker: AsyncBroker<&str> = AsyncBroker::new();
    assert_eq!(broker.publish("nobody-listening", "hello"), 0);
    broker.close(Some(Duration::from_millis(200)));
}

#[test]
fn each_publisher_keeps_its_own_message_order() {
    let broker = AsyncBroker::new();
    let poller = broker.subscribe(Exact::new("events"));

    // Four logical publishers interleave their sends to the same staging
    // queue; each one's own sequence must still arrive in order even
    // though the four streams interleave arbitrarily with each other.
    for seq in 0..50 {
        for p in 0..4 {
            broker.publish("events", (p, seq));
        }
    }

    let mut last_seq: HashMap<i32, i32> = HashMap::new();
    for _ in 0..200 {
        let (p, seq) = poller.poll().expect("dispatcher closed early");
        let last = last_seq.entry(p).or_insert(-1);
        assert!(seq > *last, "publisher {p} delivered out of order");
        *last = seq;
    }

    broker.close(Some(Duration::from_millis(200)));
}

#[test]
fn close_none_still_delivers_every_message_published_before_it() {
    let broker = AsyncBroker::new();
    let poller = broker.subscribe(Exact::new("events"));

    for i in 0..50 {
        broker.publish("events", i);
    }

    // `close(None)` must not return until the dispatcher has fanned out
    // every envelope already enqueued before this call; a plain `None`
    // close is not license to drop the backlog.
    broker.close(None);

    for i in 0..50 {
        assert_eq!(poller.poll(), Some(i));
    }
    assert_eq!(poller.poll(), None);
}

#[test]
fn closing_leaves_no_dispatcher_or_subscriber_threads_running() {
    let before = fanout::active_worker_threads();
    let broker = AsyncBroker::new();

    let pollers: Vec<_> = (0..10)
        .map(|_| broker.subscribe(Exact::new("topic")))
        .collect();

    let consumers: Vec<_> = pollers
        .into_iter()
        .map(|poller| thread::spawn(move || while poller.poll().is_some() {}))
        .collect();

    for i in 0..100 {
        broker.publish("topic", i);
    }

    broker.close(Some(Duration::from_millis(200)));
    for consumer in consumers {
        consumer.join().unwrap();
    }

    assert_eq!(fanout::active_worker_threads(), before);
}
