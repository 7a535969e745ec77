//! Expiring object pool implementation

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics};
use crate::reclaimer::Reclaimer;
use crate::semaphore::{self, Semaphore};

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::debug;

/// Minimal contract shared by pool implementations: store an object for later
/// reuse, and hand one back if any is available.
pub trait ObjectPool<T> {
    /// Add an object to the pool. Always succeeds.
    fn add(&self, item: T);

    /// Take an object out of the pool, or `None` if the pool is empty.
    fn retrieve(&self) -> Option<T>;
}

/// A pooled object together with the instant it expires.
///
/// Never modified after construction: the reclaimer only ever reads `deadline`.
struct Entry<T> {
    item: T,
    deadline: Instant,
}

impl<T> Entry<T> {
    /// Deadlines are inclusive: an entry is expired at its deadline.
    fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// Entry storage shared between a pool and its reclaimer.
///
/// Newest entries sit at the front, oldest at the back. The time-to-live is fixed,
/// so deadlines never decrease towards the front and the back entry is always
/// the next one to expire.
pub(crate) struct Store<T> {
    entries: Mutex<VecDeque<Entry<T>>>,
    time_to_live: Duration,
    pub(crate) metrics: MetricsTracker,
}

impl<T> Store<T> {
    pub fn new(time_to_live: Duration) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            time_to_live,
            metrics: MetricsTracker::new(),
        }
    }

    pub fn push_front(&self, item: T) {
        let mut entries = self.entries.lock();

        // Taken under the lock so that insertion order matches deadline order.
        let deadline = Instant::now() + self.time_to_live;
        entries.push_front(Entry { item, deadline });
        self.metrics.total_added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pop_front(&self) -> Option<T> {
        let item = self.take_front();

        if item.is_none() {
            self.record_empty();
        }
        item
    }

    /// Like [`pop_front`](Self::pop_front), but an empty store is not counted.
    pub fn take_front(&self) -> Option<T> {
        let entry = self.entries.lock().pop_front()?;

        self.metrics.total_retrieved.fetch_add(1, Ordering::Relaxed);
        Some(entry.item)
    }

    pub fn record_empty(&self) {
        self.metrics.pool_empty_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Deadline of the oldest entry, if any.
    pub fn back_deadline(&self) -> Option<Instant> {
        self.entries.lock().back().map(|entry| entry.deadline)
    }

    /// Remove the oldest entry if it is expired at `now`.
    ///
    /// The removed item is returned rather than dropped so that its destructor
    /// runs after the lock is released.
    pub fn reclaim_back(&self, now: Instant) -> Option<T> {
        let mut entries = self.entries.lock();

        if !entries.back().is_some_and(|entry| entry.is_expired_at(now)) {
            return None;
        }

        let entry = entries.pop_back()?;
        drop(entries);

        self.metrics.total_expired.fetch_add(1, Ordering::Relaxed);
        Some(entry.item)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Thread-safe LIFO object pool that discards objects left unused for longer
/// than a fixed time-to-live.
///
/// A background reclaimer thread is started with the pool and stopped when the
/// pool is dropped. Expiry is eventual: an object may still be retrieved shortly
/// after its deadline if the reclaimer has not reached it yet.
///
/// # Examples
///
/// ```
/// use expiring_objpool::{ExpiringPool, ObjectPool};
/// use std::time::Duration;
///
/// let pool = ExpiringPool::new(Duration::from_secs(30));
/// pool.add(vec![0_u8; 1024]);
/// pool.add(vec![0_u8; 2048]);
///
/// // Most recently added first.
/// assert_eq!(pool.retrieve().map(|buf| buf.len()), Some(2048));
/// assert_eq!(pool.retrieve().map(|buf| buf.len()), Some(1024));
/// assert!(pool.retrieve().is_none());
/// ```
pub struct ExpiringPool<T: Send + 'static> {
    store: Arc<Store<T>>,
    permits: Semaphore,
    config: PoolConfiguration,
    reclaimer: Reclaimer,
}

impl<T: Send + 'static> ExpiringPool<T> {
    /// Create a pool whose objects expire `time_to_live` after being added.
    ///
    /// # Panics
    ///
    /// Panics if `Instant::now() + time_to_live` cannot be represented (for
    /// example with `Duration::MAX`), or if the operating system fails to
    /// create the reclaimer thread, like [`std::thread::spawn`]. Use
    /// [`with_config`](Self::with_config) to handle either failure instead.
    pub fn new(time_to_live: Duration) -> Self {
        match Self::with_config(PoolConfiguration::new(time_to_live)) {
            Ok(pool) => pool,
            Err(err) => panic!("{err}"),
        }
    }

    /// Create a pool from a full configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use expiring_objpool::{ExpiringPool, PoolConfiguration, PoolError};
    /// use std::time::Duration;
    ///
    /// let config = PoolConfiguration::new(Duration::from_secs(5))
    ///     .with_thread_name("frames-reclaimer");
    /// let pool: ExpiringPool<String> = ExpiringPool::with_config(config).unwrap();
    /// assert_eq!(pool.time_to_live(), Duration::from_secs(5));
    ///
    /// let bad = PoolConfiguration::new(Duration::MAX);
    /// assert!(matches!(
    ///     ExpiringPool::<String>::with_config(bad),
    ///     Err(PoolError::InvalidConfiguration(_))
    /// ));
    /// ```
    pub fn with_config(config: PoolConfiguration) -> PoolResult<Self> {
        config.validate()?;

        let store = Arc::new(Store::new(config.time_to_live));
        let (permits, waiter) = semaphore::counting();

        let reclaimer = Reclaimer::spawn(
            Arc::clone(&store),
            waiter,
            &config.reclaimer_thread_name,
        )
        .map_err(|err| PoolError::ReclaimerSpawn(err.to_string()))?;

        debug!(
            time_to_live = ?config.time_to_live,
            thread = %config.reclaimer_thread_name,
            "expiring pool created"
        );

        Ok(Self {
            store,
            permits,
            config,
            reclaimer,
        })
    }

    /// Add an object to the front of the pool.
    pub fn add(&self, item: T) {
        self.store.push_front(item);

        // One permit per add, whether or not the pool was empty before.
        self.permits.signal();
    }

    /// Take the most recently added object, if any.
    pub fn retrieve(&self) -> Option<T> {
        self.store.pop_front()
    }

    /// Wait for an object to become available, up to the configured operation timeout.
    ///
    /// Polls while waiting; a wait that times out counts as a single empty
    /// retrieval in the metrics, however many polls it took.
    pub async fn retrieve_async(&self) -> PoolResult<T> {
        let timeout = self.config.operation_timeout.unwrap_or(Duration::from_secs(30));

        tokio::time::timeout(timeout, async {
            loop {
                match self.store.take_front() {
                    Some(item) => return item,
                    None => {
                        tokio::time::sleep(self.config.poll_interval).await;
                    }
                }
            }
        })
        .await
        .map_err(|_| {
            self.store.record_empty();
            PoolError::Timeout(timeout)
        })
    }

    /// Try to retrieve an object asynchronously
    pub async fn try_retrieve_async(&self) -> Option<T> {
        self.retrieve_async().await.ok()
    }

    /// Time-to-live applied to every object in this pool
    pub fn time_to_live(&self) -> Duration {
        self.config.time_to_live
    }

    /// Get available count
    pub fn available_count(&self) -> usize {
        self.store.len()
    }

    /// Whether the pool currently holds no objects
    pub fn is_empty(&self) -> bool {
        self.available_count() == 0
    }

    /// Get pool metrics
    pub fn get_metrics(&self) -> PoolMetrics {
        self.store
            .metrics
            .get_metrics(self.available_count(), self.config.time_to_live)
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.get_metrics().export()
    }

    /// Export metrics in Prometheus format
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let metrics = self.get_metrics();
        MetricsExporter::export_prometheus(&metrics, pool_name, tags)
    }
}

impl<T: Send + 'static> ObjectPool<T> for ExpiringPool<T> {
    fn add(&self, item: T) {
        ExpiringPool::add(self, item);
    }

    fn retrieve(&self) -> Option<T> {
        ExpiringPool::retrieve(self)
    }
}

impl<T: Send + 'static> Drop for ExpiringPool<T> {
    fn drop(&mut self) {
        self.reclaimer.shutdown();
        debug!(remaining = self.store.len(), "expiring pool dropped");
    }
}

impl<T: Send + 'static> fmt::Debug for ExpiringPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringPool")
            .field("time_to_live", &self.config.time_to_live)
            .field("available", &self.available_count())
            .field("pending_permits", &self.permits.available())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_retrieve_is_lifo() {
        let pool = ExpiringPool::new(Duration::from_secs(60));

        for i in 0..5 {
            pool.add(i);
        }

        let drained: Vec<_> = std::iter::from_fn(|| pool.retrieve()).collect();
        assert_eq!(drained, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_empty_pool_keeps_returning_none() {
        let pool: ExpiringPool<u32> = ExpiringPool::new(Duration::from_secs(60));

        for _ in 0..10 {
            assert!(pool.retrieve().is_none());
        }
        assert_eq!(pool.get_metrics().pool_empty_events, 10);
    }

    #[test]
    fn test_is_empty_tracks_contents() {
        let pool = ExpiringPool::new(Duration::from_secs(60));
        assert!(pool.is_empty());

        pool.add('x');
        assert!(!pool.is_empty());

        assert_eq!(pool.retrieve(), Some('x'));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_entry_expired_at_deadline() {
        let now = Instant::now();
        let entry = Entry { item: (), deadline: now };

        assert!(entry.is_expired_at(now));
        assert!(entry.is_expired_at(now + Duration::from_millis(1)));
        assert!(!Entry { item: (), deadline: now + Duration::from_millis(1) }.is_expired_at(now));
    }

    #[test]
    fn test_reclaim_back_leaves_fresh_entry() {
        let store = Store::new(Duration::from_secs(60));
        store.push_front("fresh");

        assert!(store.reclaim_back(Instant::now()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reclaim_back_removes_only_oldest() {
        let store = Store::new(Duration::ZERO);
        store.push_front("old");
        store.push_front("new");

        assert_eq!(store.reclaim_back(Instant::now()), Some("old"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.pop_front(), Some("new"));
    }

    #[test]
    fn test_expired_items_are_dropped() {
        let drops = Arc::new(AtomicUsize::new(0));
        let pool = ExpiringPool::new(Duration::from_millis(20));

        for _ in 0..3 {
            pool.add(DropCounter(Arc::clone(&drops)));
        }

        thread::sleep(Duration::from_millis(200));
        assert!(pool.is_empty());
        assert_eq!(drops.load(Ordering::SeqCst), 3);
        assert_eq!(pool.get_metrics().total_expired, 3);
    }

    #[test]
    fn test_drop_releases_pooled_items_promptly() {
        let drops = Arc::new(AtomicUsize::new(0));
        let pool = ExpiringPool::new(Duration::from_secs(3600));
        pool.add(DropCounter(Arc::clone(&drops)));
        pool.add(DropCounter(Arc::clone(&drops)));

        let started = Instant::now();
        drop(pool);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_trait_object_usage() {
        let pool = ExpiringPool::new(Duration::from_secs(60));
        let as_trait: &dyn ObjectPool<String> = &pool;

        as_trait.add("hello".to_string());
        assert_eq!(as_trait.retrieve().as_deref(), Some("hello"));
        assert!(as_trait.retrieve().is_none());
    }

    #[tokio::test]
    async fn test_async_retrieve_waits_for_add() {
        let pool = Arc::new(ExpiringPool::with_config(
            PoolConfiguration::new(Duration::from_secs(60))
                .with_timeout(Duration::from_secs(5))
                .with_poll_interval(Duration::from_millis(5)),
        )
        .unwrap());

        let producer = Arc::clone(&pool);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            producer.add(42);
        });

        assert_eq!(pool.retrieve_async().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_async_retrieve_times_out() {
        let pool: ExpiringPool<u32> = ExpiringPool::with_config(
            PoolConfiguration::new(Duration::from_secs(60))
                .with_timeout(Duration::from_millis(30)),
        )
        .unwrap();

        let result = pool.retrieve_async().await;
        assert!(matches!(result, Err(PoolError::Timeout(d)) if d == Duration::from_millis(30)));
        assert!(pool.try_retrieve_async().await.is_none());
    }

    #[tokio::test]
    async fn test_async_wait_counts_one_empty_event() {
        let pool: ExpiringPool<u32> = ExpiringPool::with_config(
            PoolConfiguration::new(Duration::from_secs(60))
                .with_timeout(Duration::from_millis(100))
                .with_poll_interval(Duration::from_millis(1)),
        )
        .unwrap();

        assert!(pool.retrieve_async().await.is_err());

        let metrics = pool.get_metrics();
        assert_eq!(metrics.pool_empty_events, 1);
        assert_eq!(metrics.total_retrieved, 0);
    }

    #[tokio::test]
    async fn test_successful_async_wait_counts_no_empty_event() {
        let pool = Arc::new(ExpiringPool::with_config(
            PoolConfiguration::new(Duration::from_secs(60))
                .with_poll_interval(Duration::from_millis(1)),
        )
        .unwrap());

        let producer = Arc::clone(&pool);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            producer.add(7_u32);
        });

        assert_eq!(pool.retrieve_async().await.unwrap(), 7);

        let metrics = pool.get_metrics();
        assert_eq!(metrics.pool_empty_events, 0);
        assert_eq!(metrics.total_retrieved, 1);
    }

    #[test]
    fn test_hot_cycling_keeps_permits_as_a_count() {
        let pool = ExpiringPool::new(Duration::from_secs(60));
        pool.add(0_u32);

        for i in 1..=100_000_u32 {
            pool.add(i);
            assert_eq!(pool.retrieve(), Some(i));
        }

        assert_eq!(pool.available_count(), 1);
        // The reclaimer holds at most the resident entry's permit.
        let pending = pool.permits.available();
        assert!((100_000..=100_001).contains(&pending), "pending = {pending}");

        let started = Instant::now();
        drop(pool);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    #[should_panic(expected = "Invalid pool configuration")]
    fn test_new_panics_on_unrepresentable_ttl() {
        let _pool: ExpiringPool<u32> = ExpiringPool::new(Duration::MAX);
    }
}
