use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram, register_histogram_vec,
    register_int_counter_vec, CounterVec, Encoder, GaugeVec, Histogram, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::time::Instant;

pub static OPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("bookbay_ops_total", "Requests by operation", &["op"]).unwrap()
});

pub static OP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!("op_duration_seconds", "Operation durations", &["op"]).unwrap()
});

pub static SEARCH_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "search_results",
        "Books returned per search",
        vec![0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0]
    )
    .unwrap()
});

pub static CHECKOUT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("checkout_total", "Checkouts by result", &["result"]).unwrap()
});

pub static SNAPSHOT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("snapshot_total", "Snapshots by result", &["result"]).unwrap()
});

pub static SNAPSHOT_DURATION_SEC: Lazy<Histogram> =
    Lazy::new(|| register_histogram!("snapshot_duration_seconds", "Snapshot duration").unwrap());

pub static STORE_RECORDS: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!("store_records", "Stored records by kind", &["kind"]).unwrap()
});

/// Counts an operation and records its latency when dropped.
pub struct OpTimer {
    op: &'static str,
    start: Instant,
}

impl OpTimer {
    pub fn start(op: &'static str) -> Self {
        OPS_TOTAL.with_label_values(&[op]).inc();
        Self {
            op,
            start: Instant::now(),
        }
    }
}

impl Drop for OpTimer {
    fn drop(&mut self) {
        OP_DURATION
            .with_label_values(&[self.op])
            .observe(self.start.elapsed().as_secs_f64());
    }
}

pub fn record_stats(stats: bookbay_storage::StoreStats) {
    for (kind, n) in [
        ("users", stats.users),
        ("sessions", stats.sessions),
        ("carts", stats.carts),
        ("orders", stats.orders),
        ("messages", stats.messages),
    ] {
        STORE_RECORDS.with_label_values(&[kind]).set(n as f64);
    }
}

pub async fn render() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    let _ = encoder.encode(&prometheus::gather(), &mut buf);
    (StatusCode::OK, String::from_utf8(buf).unwrap_or_default())
}
