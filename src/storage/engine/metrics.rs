use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

/// Statement-latency recorder behind the engine's `status()` surface.
#[derive(Debug)]
pub struct Metrics {
    latencies: Mutex<Histogram<u64>>,
}

impl Metrics {
    pub fn new() -> Metrics {
        Metrics {
            // Three significant digits, microseconds up to one minute.
            latencies: Mutex::new(
                Histogram::new_with_bounds(1, 60_000_000, 3).expect("histogram bounds are static"),
            ),
        }
    }

    pub fn record(&self, elapsed: Duration) {
        if let Ok(mut histogram) = self.latencies.lock() {
            histogram.saturating_record(elapsed.as_micros() as u64);
        }
    }

    pub fn snapshot(&self, databases: u64, tables: u64) -> Status {
        let histogram = self.latencies.lock().unwrap();
        Status {
            databases,
            tables,
            statements: histogram.len(),
            latency_p50_us: histogram.value_at_quantile(0.5),
            latency_p99_us: histogram.value_at_quantile(0.99),
            latency_max_us: histogram.max(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine status: catalog counts plus statement-latency percentiles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub databases: u64,
    pub tables: u64,
    pub statements: u64,
    pub latency_p50_us: u64,
    pub latency_p99_us: u64,
    pub latency_max_us: u64,
}
