// Small demonstration of an expiring pool.
// The library itself lives in lib.rs.

use expiring_objpool::ExpiringPool;
use std::thread;
use std::time::Duration;

fn main() {
    println!("=== expiring_objpool demo ===");

    let pool = ExpiringPool::new(Duration::from_millis(100));

    pool.add(vec![0_u8; 1024]);
    match pool.retrieve() {
        Some(buffer) => println!("  Reused buffer of {} bytes", buffer.len()),
        None => println!("  Nothing to reuse"),
    }

    pool.add(vec![0_u8; 1024]);
    thread::sleep(Duration::from_millis(150));
    println!("  Available after expiry: {}", pool.available_count());

    println!();
    print!("{}", pool.export_metrics_prometheus("demo", None));
}
