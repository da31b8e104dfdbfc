//! Prometheus counters for the decisions taken by the engines.
//!
//! Counters are usable before [`init_metrics`] runs; registration only makes
//! them visible to [`gather_metrics`].
//!
//! ```no_run
//! use alm_engine::metrics::CORRELATIONS_TOTAL;
//!
//! CORRELATIONS_TOTAL.with_label_values(&["PATTERN"]).inc();
//! ```

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Opts, Registry};

const NAMESPACE: &str = "alm_engine";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Symptoms linked to a root cause
    ///
    /// Labels: rule_type
    pub static ref CORRELATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("correlations_total", "Total number of symptom alarms linked to a root cause")
            .namespace(NAMESPACE),
        &["rule_type"]
    ).expect("Failed to create CORRELATIONS_TOTAL metric");

    /// Notifications handed to a channel sender
    ///
    /// Labels: channel
    pub static ref NOTIFICATIONS_SENT_TOTAL: CounterVec = CounterVec::new(
        Opts::new("notifications_sent_total", "Total number of notifications dispatched")
            .namespace(NAMESPACE),
        &["channel"]
    ).expect("Failed to create NOTIFICATIONS_SENT_TOTAL metric");

    /// Notifications held back by the throttle
    ///
    /// Labels: reason (cooldown, hourly_cap)
    pub static ref NOTIFICATIONS_THROTTLED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("notifications_throttled_total", "Total number of throttled notifications")
            .namespace(NAMESPACE),
        &["reason"]
    ).expect("Failed to create NOTIFICATIONS_THROTTLED_TOTAL metric");

    pub static ref ESCALATION_STEPS_FIRED_TOTAL: Counter = Counter::with_opts(
        Opts::new("escalation_steps_fired_total", "Total number of escalation steps fired")
            .namespace(NAMESPACE)
    ).expect("Failed to create ESCALATION_STEPS_FIRED_TOTAL metric");

    pub static ref ESCALATIONS_CANCELLED_TOTAL: Counter = Counter::with_opts(
        Opts::new("escalations_cancelled_total", "Total number of escalations cancelled")
            .namespace(NAMESPACE)
    ).expect("Failed to create ESCALATIONS_CANCELLED_TOTAL metric");

    /// Alarms forced into SUPPRESSED
    ///
    /// Labels: reason (maintenance, correlation)
    pub static ref ALARMS_SUPPRESSED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("alarms_suppressed_total", "Total number of suppressed alarms")
            .namespace(NAMESPACE),
        &["reason"]
    ).expect("Failed to create ALARMS_SUPPRESSED_TOTAL metric");

    /// Failed dispatch attempts
    ///
    /// Labels: channel
    pub static ref DISPATCH_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("dispatch_failures_total", "Total number of failed dispatch attempts")
            .namespace(NAMESPACE),
        &["channel"]
    ).expect("Failed to create DISPATCH_FAILURES_TOTAL metric");
}

/// Register all metrics with the global registry
///
/// Safe to call more than once.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CORRELATIONS_TOTAL.clone()),
        Box::new(NOTIFICATIONS_SENT_TOTAL.clone()),
        Box::new(NOTIFICATIONS_THROTTLED_TOTAL.clone()),
        Box::new(ESCALATION_STEPS_FIRED_TOTAL.clone()),
        Box::new(ESCALATIONS_CANCELLED_TOTAL.clone()),
        Box::new(ALARMS_SUPPRESSED_TOTAL.clone()),
        Box::new(DISPATCH_FAILURES_TOTAL.clone()),
    ];

    for collector in collectors {
        match PROMETHEUS_REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e),
        }
    }

    tracing::debug!("Prometheus metrics initialized");
    Ok(())
}

/// Render all registered metrics in the Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to UTF-8: {}", e);
        String::from("# Error converting metrics\n")
    })
}
