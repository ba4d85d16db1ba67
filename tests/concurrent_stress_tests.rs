//! Concurrent stress tests for high-contention scenarios
//! One producer feeding one or more consumers a million integers, checking
//! that every value arrives exactly once.
#![cfg(not(loom))]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
    time::Instant,
};

use spinq::{SpmcQueue, SpscQueue};

const ITEMS: usize = 1_000_000;

/// Checks that `received` holds every value of `0..ITEMS` exactly once
fn assert_exactly_once(received: &[Vec<usize>]) {
    let total: usize = received.iter().map(Vec::len).sum();
    assert_eq!(total, ITEMS, "lost or duplicated items");

    let checksum: u64 = received.iter().flatten().map(|&v| v as u64).sum();
    assert_eq!(checksum, (ITEMS as u64 - 1) * ITEMS as u64 / 2);

    let mut seen = vec![false; ITEMS];
    for &value in received.iter().flatten() {
        assert!(value < ITEMS, "value {} out of range", value);
        assert!(!seen[value], "value {} delivered twice", value);
        seen[value] = true;
    }
}

fn run_spmc(consumers: usize, capacity: usize) -> Vec<Vec<usize>> {
    let (mut tx, rx) = SpmcQueue::new(capacity).unwrap();
    let barrier = Arc::new(Barrier::new(consumers + 1));
    let done = Arc::new(AtomicBool::new(false));
    let popped = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..consumers)
        .map(|_| {
            let rx = rx.clone();
            let barrier = barrier.clone();
            let done = done.clone();
            let popped = popped.clone();
            thread::spawn(move || {
                let mut local = Vec::with_capacity(ITEMS / consumers);
                barrier.wait();
                loop {
                    match rx.pop() {
                        Some(value) => {
                            local.push(value);
                            popped.fetch_add(1, Ordering::Relaxed);
                        }
                        None if done.load(Ordering::Acquire) && rx.is_empty() => break,
                        None => thread::yield_now(),
                    }
                }
                // Order within one consumer follows global push order.
                assert!(local.windows(2).all(|w| w[0] < w[1]));
                local
            })
        })
        .collect();
    drop(rx);

    barrier.wait();
    let start = Instant::now();
    for i in 0..ITEMS {
        while !tx.push(i) {
            thread::yield_now();
        }
    }
    done.store(true, Ordering::Release);

    let received: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    println!(
        "spmc: {} consumers, capacity {}, {} items in {:?}",
        consumers,
        capacity,
        popped.load(Ordering::Relaxed),
        start.elapsed()
    );
    assert!(tx.is_empty());
    received
}

#[cfg(test)]
mod concurrent_stress_tests {
    use super::*;

    /// Test: SPSC queue under full-speed producer and consumer
    #[test]
    fn stress_spsc_million_items() {
        let (mut tx, mut rx) = SpscQueue::new(1024).unwrap();

        let producer = thread::spawn(move || {
            for i in 0..ITEMS {
                while !tx.push(i) {
                    thread::yield_now();
                }
            }
        });

        let consumer = thread::spawn(move || {
            let mut received = Vec::with_capacity(ITEMS);
            while received.len() < ITEMS {
                if let Some(value) = rx.pop() {
                    received.push(value);
                } else {
                    thread::yield_now();
                }
            }
            assert!(rx.pop().is_none());
            received
        });

        producer.join().unwrap();
        let received = consumer.join().unwrap();
        assert!(received.iter().copied().eq(0..ITEMS), "FIFO order broken");
    }

    /// Test: SPMC with a single consumer behaves like SPSC
    #[test]
    fn stress_spmc_one_consumer() {
        let received = run_spmc(1, 1024);
        assert!(received[0].iter().copied().eq(0..ITEMS));
    }

    /// Test: SPMC with four contending consumers
    #[test]
    fn stress_spmc_four_consumers() {
        assert_exactly_once(&run_spmc(4, 1024));
    }

    /// Test: SPMC with eight contending consumers on a small queue
    #[test]
    fn stress_spmc_eight_consumers() {
        assert_exactly_once(&run_spmc(8, 64));
    }

    /// Test: tiny capacity forces the producer to hit the full queue constantly
    #[test]
    fn stress_spmc_capacity_one() {
        assert_exactly_once(&run_spmc(4, 1));
    }

    /// Test: heap-owning elements survive the handoff intact
    #[test]
    fn stress_spmc_strings() {
        const STRINGS: usize = 100_000;
        let (mut tx, rx) = SpmcQueue::new(256).unwrap();
        let done = Arc::new(AtomicBool::new(false));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let rx = rx.clone();
                let done = done.clone();
                thread::spawn(move || {
                    let mut count = 0usize;
                    loop {
                        match rx.pop() {
                            Some(text) => {
                                let text: String = text;
                                let n: usize = text.strip_prefix("msg-").unwrap().parse().unwrap();
                                assert!(n < STRINGS);
                                count += 1;
                            }
                            None if done.load(Ordering::Acquire) && rx.is_empty() => break,
                            None => thread::yield_now(),
                        }
                    }
                    count
                })
            })
            .collect();

        for i in 0..STRINGS {
            let mut text = Some(format!("msg-{}", i));
            while let Some(value) = text.take() {
                if let Err(back) = tx.try_push(value) {
                    text = Some(back);
                    thread::yield_now();
                }
            }
        }
        done.store(true, Ordering::Release);

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, STRINGS);
    }
}
