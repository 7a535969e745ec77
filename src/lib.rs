//! # expiring_objpool
//!
//! Thread-safe object pool for recycling short-lived objects, where any
//! object left unused in the pool longer than a fixed time-to-live is
//! discarded by a background reclaimer.
//!
//! ## Features
//!
//! - LIFO reuse: the most recently pooled object is handed out first
//! - Fixed time-to-live per pool, enforced by a dedicated reclaimer thread
//! - Reclaimer blocks while the pool is idle and sleeps until the next deadline
//! - Reclaimer is stopped and joined when the pool is dropped
//! - Async retrieval with timeout
//! - Metrics and Prometheus export
//!
//! ## Quick Start
//!
//! ```rust
//! use expiring_objpool::ExpiringPool;
//! use std::time::Duration;
//!
//! let pool = ExpiringPool::new(Duration::from_secs(30));
//! pool.add(String::with_capacity(4096));
//!
//! let buffer = pool.retrieve().unwrap_or_default();
//! assert!(buffer.capacity() >= 4096);
//! ```

mod pool;
mod config;
mod metrics;
mod reclaimer;
mod semaphore;
mod errors;

pub use pool::{ExpiringPool, ObjectPool};
pub use config::{PoolConfiguration, DEFAULT_RECLAIMER_THREAD_NAME};
pub use metrics::{PoolMetrics, MetricsExporter};
pub use errors::{PoolError, PoolResult};
