use export::ExportFormat;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,
    backend_fetches: AtomicUsize,

    // Exports, indexed like `ExportFormat::ALL`
    exports: [AtomicUsize; 5],
    bytes_exported: AtomicU64,

    // Timing (in microseconds)
    total_export_time_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            backend_fetches: AtomicUsize::new(0),
            exports: Default::default(),
            bytes_exported: AtomicU64::new(0),
            total_export_time_us: AtomicU64::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_backend_fetch(&self) {
        self.backend_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_export(&self, format: ExportFormat, duration: Duration, bytes: usize) {
        self.exports[format_slot(format)].fetch_add(1, Ordering::Relaxed);
        self.bytes_exported.fetch_add(bytes as u64, Ordering::Relaxed);
        self.total_export_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let exports_by_format: BTreeMap<String, usize> = ExportFormat::ALL
            .iter()
            .map(|f| (f.to_string(), self.exports[format_slot(*f)].load(Ordering::Relaxed)))
            .collect();
        let total_exports: usize = exports_by_format.values().sum();

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            backend_fetches: self.backend_fetches.load(Ordering::Relaxed),
            total_exports,
            exports_by_format,
            bytes_exported: self.bytes_exported.load(Ordering::Relaxed),
            avg_export_time_ms: avg_time_ms(&self.total_export_time_us, total_exports),
        }
    }
}

fn format_slot(format: ExportFormat) -> usize {
    match format {
        ExportFormat::Json => 0,
        ExportFormat::Text => 1,
        ExportFormat::Markdown => 2,
        ExportFormat::Csv => 3,
        ExportFormat::Xlsx => 4,
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: usize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    if count > 0 {
        total / count as f64 / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub backend_fetches: usize,
    pub total_exports: usize,
    pub exports_by_format: BTreeMap<String, usize>,
    pub bytes_exported: u64,
    pub avg_export_time_ms: f64,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
