//! Basic usage of an expiring pool
//!
//! Run with: cargo run --example basic

use expiring_objpool::{ExpiringPool, ObjectPool, PoolConfiguration};
use std::thread;
use std::time::Duration;

fn main() {
    println!("=== Basic Expiring Pool Example ===\n");

    // Example 1: Reuse
    println!("1. Reusing a buffer:");
    let pool = ExpiringPool::new(Duration::from_millis(200));
    pool.add(Vec::<u8>::with_capacity(4096));

    let mut buffer = pool.retrieve().unwrap_or_default();
    buffer.extend_from_slice(b"hello");
    println!("   Got buffer with capacity {}", buffer.capacity());
    buffer.clear();
    pool.add(buffer);
    println!("   Available after returning: {}\n", pool.available_count());

    // Example 2: LIFO order
    println!("2. Most recently added comes out first:");
    let names = ExpiringPool::new(Duration::from_secs(10));
    for name in ["first", "second", "third"] {
        names.add(name);
    }
    while let Some(name) = names.retrieve() {
        println!("   {}", name);
    }
    println!();

    // Example 3: Expiry
    println!("3. Unused objects expire:");
    thread::sleep(Duration::from_millis(300));
    println!("   Available after 300ms: {}", pool.available_count());
    println!("   Retrieve -> {:?}\n", pool.retrieve().map(|b| b.capacity()));

    // Example 4: Configuration and the trait
    println!("4. Custom configuration behind the ObjectPool trait:");
    let config = PoolConfiguration::new(Duration::from_secs(5)).with_thread_name("strings-reclaimer");
    let strings: ExpiringPool<String> = match ExpiringPool::with_config(config) {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("   Could not create pool: {}", err);
            return;
        }
    };
    let as_trait: &dyn ObjectPool<String> = &strings;
    as_trait.add(String::from("pooled"));
    println!("   Retrieved via trait: {:?}\n", as_trait.retrieve());

    // Example 5: Metrics
    println!("5. Metrics:");
    for (key, value) in pool.export_metrics() {
        println!("   {}: {}", key, value);
    }

    println!("\n=== Example Complete ===");
}
