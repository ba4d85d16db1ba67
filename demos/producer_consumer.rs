//! Producer-consumer walkthrough for both queue variants
//!
//! A producer pushes ten items into a five-slot queue and backs off with a
//! short sleep whenever it is full; consumers poll at their own pace.
//!
//! Run with `cargo run --example producer_consumer --features tracing` to see
//! the queue setup / teardown log lines as well.

use spinq::{SpmcQueue, SpscQueue};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

const ITEMS: i32 = 10;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    spinq::init_tracing();

    println!("Bounded Queue Producer-Consumer Demo");
    println!("====================================");

    spsc_demo()?;

    println!("\n{}", "=".repeat(50));

    spmc_demo()?;

    Ok(())
}

fn spsc_demo() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n1. SPSC queue (capacity 5)\n");

    let (mut tx, mut rx) = SpscQueue::<i32>::new(5)?;
    let finished = Arc::new(AtomicBool::new(false));

    let producer = {
        let finished = finished.clone();
        thread::spawn(move || {
            for i in 0..ITEMS {
                while !tx.push(i) {
                    println!("Producer: queue is full, retrying to push {} ...", i);
                    thread::sleep(Duration::from_millis(25));
                }
                println!("Producer: produced {}", i);
                thread::sleep(Duration::from_millis(100));
            }
            finished.store(true, Ordering::Release);
        })
    };

    let consumer = thread::spawn(move || loop {
        match rx.pop() {
            Some(value) => println!("Consumer: consumed {}", value),
            None if finished.load(Ordering::Acquire) && rx.is_empty() => break,
            None => println!("Consumer: queue is empty, waiting for data..."),
        }
        thread::sleep(Duration::from_millis(300));
    });

    producer.join().map_err(|_| "producer panicked")?;
    consumer.join().map_err(|_| "consumer panicked")?;

    println!("\nSPSC demo finished.");
    Ok(())
}

fn spmc_demo() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n2. SPMC queue (capacity 5, two consumers)\n");

    let (mut tx, rx) = SpmcQueue::<i32>::new(5)?;
    let finished = Arc::new(AtomicBool::new(false));

    let producer = {
        let finished = finished.clone();
        thread::spawn(move || {
            for i in 0..ITEMS {
                while !tx.push(i) {
                    println!("Producer: queue is full, retrying to push {}", i);
                    thread::sleep(Duration::from_millis(25));
                }
                println!("Producer: produced {}", i);
                thread::sleep(Duration::from_millis(100));
            }
            finished.store(true, Ordering::Release);
        })
    };

    let consumers: Vec<_> = [(1, 400u64), (2, 250u64)]
        .into_iter()
        .map(|(id, pause_ms)| {
            let rx = rx.clone();
            let finished = finished.clone();
            thread::spawn(move || loop {
                match rx.pop() {
                    Some(value) => println!("Consumer {}: consumed {}", id, value),
                    None if finished.load(Ordering::Acquire) && rx.is_empty() => break,
                    None => println!("Consumer {}: queue is empty, waiting for data...", id),
                }
                thread::sleep(Duration::from_millis(pause_ms));
            })
        })
        .collect();
    drop(rx);

    producer.join().map_err(|_| "producer panicked")?;
    for consumer in consumers {
        consumer.join().map_err(|_| "consumer panicked")?;
    }

    println!("\nSPMC demo finished.");
    Ok(())
}
