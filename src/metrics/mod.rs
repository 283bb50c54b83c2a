//! Prometheus collectors for the notification core.
//!
//! Collectors are process-global and unregistered; embedders expose them by
//! calling [`register_custom_metrics`] on the registry they scrape. The
//! dispatcher updates them only when `DispatchConfig::enable_metrics` is set.

use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Encoder;
use prometheus::Histogram;
use prometheus::HistogramOpts;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;


lazy_static! {
    pub static ref WATCHER_REGISTRATIONS: IntCounter = IntCounter::new(
        "watcher_registrations_total",
        "Watchers added to a template group"
    )
    .expect("metric can not be created");

    pub static ref MATCHED_WATCHERS: IntCounterVec = IntCounterVec::new(
        Opts::new("matched_watchers_total", "Watchers returned for transitions"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref CANCELLED_WATCHERS: IntCounter = IntCounter::new(
        "cancelled_watchers_total",
        "Watchers explicitly cancelled"
    )
    .expect("metric can not be created");

    pub static ref REAPED_WATCHERS: IntCounter = IntCounter::new(
        "reaped_watchers_total",
        "Watchers removed after lease expiration"
    )
    .expect("metric can not be created");

    pub static ref PRUNED_TEMPLATE_GROUPS: IntCounter = IntCounter::new(
        "pruned_template_groups_total",
        "Empty template groups removed by reaping"
    )
    .expect("metric can not be created");

    pub static ref MATCH_SCAN_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "match_scan_duration_us",
            "Histogram of transition match scan duration in microseconds"
        )
        .buckets(exponential_buckets(1.0, 2.0, 20).expect("valid bucket layout"))
    )
    .expect("metric can not be created");
}

/// Registers every collector on `registry`.
pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(WATCHER_REGISTRATIONS.clone()))?;
    registry.register(Box::new(MATCHED_WATCHERS.clone()))?;
    registry.register(Box::new(CANCELLED_WATCHERS.clone()))?;
    registry.register(Box::new(REAPED_WATCHERS.clone()))?;
    registry.register(Box::new(PRUNED_TEMPLATE_GROUPS.clone()))?;
    registry.register(Box::new(MATCH_SCAN_DURATION.clone()))?;
    Ok(())
}

/// Text exposition of `registry`, ready to serve on a scrape endpoint.
pub fn encode_text(registry: &Registry) -> prometheus::Result<String> {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
