use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("trades_created_total").absolute(0);
    counter!("trades_updated_total").absolute(0);
    counter!("trades_deleted_total").absolute(0);
    counter!("accounts_created_total").absolute(0);
    counter!("documentation_items_created_total").absolute(0);
    counter!("documentation_items_deleted_total").absolute(0);

    handle
}
