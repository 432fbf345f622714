use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts,
};
use std::sync::LazyLock;
use std::time::Instant;
use tracing::warn;

const FALLBACK_NAME: &str = "coffer_metrics_fallback";
const FALLBACK_HELP: &str = "metrics fallback";

// Registration only fails on duplicate names; the unregistered copy keeps
// call sites working without exporting anything.
fn counter_vec_or_fallback(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    match register_int_counter_vec!(name, help, labels) {
        Ok(metric) => metric,
        Err(err) => {
            warn!(event = "metrics_register_failed", metric = name, error = %err);
            IntCounterVec::new(Opts::new(name, help), labels).unwrap_or_else(|err| {
                warn!(event = "metrics_fallback_failed", metric = name, error = %err);
                IntCounterVec::new(Opts::new(FALLBACK_NAME, FALLBACK_HELP), &["name"])
                    .expect("fallback metric")
            })
        }
    }
}

fn gauge_or_fallback(name: &str, help: &str) -> IntGauge {
    match register_int_gauge!(name, help) {
        Ok(metric) => metric,
        Err(err) => {
            warn!(event = "metrics_register_failed", metric = name, error = %err);
            IntGauge::new(name, help).unwrap_or_else(|err| {
                warn!(event = "metrics_fallback_failed", metric = name, error = %err);
                IntGauge::new(FALLBACK_NAME, FALLBACK_HELP).expect("fallback metric")
            })
        }
    }
}

fn histogram_or_fallback(name: &str, help: &str, buckets: Vec<f64>) -> Histogram {
    match register_histogram!(name, help, buckets.clone()) {
        Ok(metric) => metric,
        Err(err) => {
            warn!(event = "metrics_register_failed", metric = name, error = %err);
            Histogram::with_opts(HistogramOpts::new(name, help).buckets(buckets)).unwrap_or_else(
                |err| {
                    warn!(event = "metrics_fallback_failed", metric = name, error = %err);
                    Histogram::with_opts(HistogramOpts::new(FALLBACK_NAME, FALLBACK_HELP))
                        .expect("fallback metric")
                },
            )
        }
    }
}

fn histogram_vec_or_fallback(
    name: &str,
    help: &str,
    labels: &[&str],
    buckets: Vec<f64>,
) -> HistogramVec {
    match register_histogram_vec!(name, help, labels, buckets.clone()) {
        Ok(metric) => metric,
        Err(err) => {
            warn!(event = "metrics_register_failed", metric = name, error = %err);
            let opts = HistogramOpts::new(name, help).buckets(buckets);
            HistogramVec::new(opts, labels).unwrap_or_else(|err| {
                warn!(event = "metrics_fallback_failed", metric = name, error = %err);
                HistogramVec::new(HistogramOpts::new(FALLBACK_NAME, FALLBACK_HELP), &["name"])
                    .expect("fallback metric")
            })
        }
    }
}

fn http_buckets() -> Vec<f64> {
    vec![
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ]
}

fn diff_size_buckets() -> Vec<f64> {
    vec![0.0, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]
}

static ENTRY_OPERATIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    counter_vec_or_fallback(
        "coffer_entry_operations_total",
        "Entry operations",
        &["op", "result"],
    )
});

static ENTRY_CONFLICTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    counter_vec_or_fallback(
        "coffer_entry_conflicts_total",
        "Writes resolved by forking a conflict entry",
        &["op"],
    )
});

static SYNC_DIFF_ENTRIES: LazyLock<Histogram> = LazyLock::new(|| {
    histogram_or_fallback(
        "coffer_sync_diff_entries",
        "Entries returned per diff request",
        diff_size_buckets(),
    )
});

static AUTH_LOGINS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    counter_vec_or_fallback("coffer_auth_logins_total", "Auth login attempts", &["result"])
});

static AUTH_REGISTERS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    counter_vec_or_fallback(
        "coffer_auth_register_total",
        "Auth registration attempts",
        &["result"],
    )
});

static HTTP_IN_FLIGHT: LazyLock<IntGauge> =
    LazyLock::new(|| gauge_or_fallback("coffer_http_in_flight", "HTTP requests in flight"));

static HTTP_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    counter_vec_or_fallback(
        "coffer_http_requests_total",
        "HTTP requests",
        &["method", "route", "status_class"],
    )
});

static HTTP_LATENCY: LazyLock<HistogramVec> = LazyLock::new(|| {
    histogram_vec_or_fallback(
        "coffer_http_request_duration_seconds",
        "HTTP request latency",
        &["route"],
        http_buckets(),
    )
});

pub fn entry_operation(op: &str, result: &str) {
    ENTRY_OPERATIONS.with_label_values(&[op, result]).inc();
}

pub fn entry_conflict(op: &str) {
    ENTRY_CONFLICTS.with_label_values(&[op]).inc();
}

pub fn sync_diff_entries(count: usize) {
    SYNC_DIFF_ENTRIES.observe(count as f64);
}

pub fn auth_login(result: &str) {
    AUTH_LOGINS.with_label_values(&[result]).inc();
}

pub fn auth_register(result: &str) {
    AUTH_REGISTERS.with_label_values(&[result]).inc();
}

pub async fn http_metrics(req: Request<Body>, next: Next) -> Response {
    let method = req.method().as_str().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("unmatched")
        .to_string();
    HTTP_IN_FLIGHT.inc();
    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();
    HTTP_IN_FLIGHT.dec();
    record_http_request(&method, &route, response.status().as_u16(), elapsed);
    response
}

pub fn record_http_request(method: &str, route: &str, status: u16, duration_seconds: f64) {
    let status_class = match status / 100 {
        1 => "1xx",
        2 => "2xx",
        3 => "3xx",
        4 => "4xx",
        5 => "5xx",
        _ => "unknown",
    };
    HTTP_REQUESTS
        .with_label_values(&[method, route, status_class])
        .inc();
    HTTP_LATENCY
        .with_label_values(&[route])
        .observe(duration_seconds);
}
