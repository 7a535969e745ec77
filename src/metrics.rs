//! Metrics collection and export for expiring pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Metrics data for a pool
///
/// # Examples
///
/// ```
/// use expiring_objpool::ExpiringPool;
/// use std::time::Duration;
///
/// let pool = ExpiringPool::new(Duration::from_secs(60));
/// pool.add("a");
/// pool.add("b");
/// let _ = pool.retrieve();
///
/// let metrics = pool.get_metrics();
/// assert_eq!(metrics.total_added, 2);
/// assert_eq!(metrics.total_retrieved, 1);
/// assert_eq!(metrics.available_objects, 1);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Total objects added to the pool
    pub total_added: usize,

    /// Total objects handed back out by retrieval
    pub total_retrieved: usize,

    /// Total objects discarded by the reclaimer
    pub total_expired: usize,

    /// Number of retrievals that found the pool empty
    pub pool_empty_events: usize,

    /// Objects currently waiting in the pool
    pub available_objects: usize,

    /// Time-to-live applied to every object
    pub time_to_live: Duration,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_added".to_string(), self.total_added.to_string());
        metrics.insert("total_retrieved".to_string(), self.total_retrieved.to_string());
        metrics.insert("total_expired".to_string(), self.total_expired.to_string());
        metrics.insert("pool_empty_events".to_string(), self.pool_empty_events.to_string());
        metrics.insert("available_objects".to_string(), self.available_objects.to_string());
        metrics.insert(
            "time_to_live_seconds".to_string(),
            format!("{:.3}", self.time_to_live.as_secs_f64()),
        );
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use expiring_objpool::ExpiringPool;
    /// use std::collections::HashMap;
    /// use std::time::Duration;
    ///
    /// let pool: ExpiringPool<Vec<u8>> = ExpiringPool::new(Duration::from_secs(60));
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("buffers", Some(&tags));
    /// assert!(output.contains("expiring_pool_objects_available"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        // Gauge metrics
        output.push_str("# HELP expiring_pool_objects_available Objects currently pooled\n");
        output.push_str("# TYPE expiring_pool_objects_available gauge\n");
        output.push_str(&format!("expiring_pool_objects_available{{{}}} {}\n", labels, metrics.available_objects));

        output.push_str("# HELP expiring_pool_ttl_seconds Time-to-live of pooled objects\n");
        output.push_str("# TYPE expiring_pool_ttl_seconds gauge\n");
        output.push_str(&format!("expiring_pool_ttl_seconds{{{}}} {:.3}\n", labels, metrics.time_to_live.as_secs_f64()));

        // Counter metrics
        output.push_str("# HELP expiring_pool_objects_added_total Total objects added\n");
        output.push_str("# TYPE expiring_pool_objects_added_total counter\n");
        output.push_str(&format!("expiring_pool_objects_added_total{{{}}} {}\n", labels, metrics.total_added));

        output.push_str("# HELP expiring_pool_objects_retrieved_total Total objects retrieved\n");
        output.push_str("# TYPE expiring_pool_objects_retrieved_total counter\n");
        output.push_str(&format!("expiring_pool_objects_retrieved_total{{{}}} {}\n", labels, metrics.total_retrieved));

        output.push_str("# HELP expiring_pool_objects_expired_total Total objects discarded after expiry\n");
        output.push_str("# TYPE expiring_pool_objects_expired_total counter\n");
        output.push_str(&format!("expiring_pool_objects_expired_total{{{}}} {}\n", labels, metrics.total_expired));

        output.push_str("# HELP expiring_pool_events_empty_total Retrievals from an empty pool\n");
        output.push_str("# TYPE expiring_pool_events_empty_total counter\n");
        output.push_str(&format!("expiring_pool_events_empty_total{{{}}} {}\n", labels, metrics.pool_empty_events));

        output
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            for (key, value) in tags {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal metrics tracker, shared by the pool and its reclaimer
#[derive(Debug, Default)]
pub(crate) struct MetricsTracker {
    pub total_added: AtomicUsize,
    pub total_retrieved: AtomicUsize,
    pub total_expired: AtomicUsize,
    pub pool_empty_events: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_metrics(&self, available: usize, time_to_live: Duration) -> PoolMetrics {
        PoolMetrics {
            total_added: self.total_added.load(Ordering::Relaxed),
            total_retrieved: self.total_retrieved.load(Ordering::Relaxed),
            total_expired: self.total_expired.load(Ordering::Relaxed),
            pool_empty_events: self.pool_empty_events.load(Ordering::Relaxed),
            available_objects: available,
            time_to_live,
        }
    }
}
