use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Process-wide planning counters.
#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    model_attempts_total: AtomicU64,
    planner_timeouts_total: AtomicU64,
    poi_fallback_total: AtomicU64,
    template_fallback_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub model_attempts_total: u64,
    pub planner_timeouts_total: u64,
    pub poi_fallback_total: u64,
    pub template_fallback_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_model_attempt(&self) {
        self.model_attempts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_planner_timeout(&self) {
        self.planner_timeouts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_poi_fallback(&self) {
        self.poi_fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_template_fallback(&self) {
        self.template_fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            model_attempts_total: self.model_attempts_total.load(Ordering::Relaxed),
            planner_timeouts_total: self.planner_timeouts_total.load(Ordering::Relaxed),
            poi_fallback_total: self.poi_fallback_total.load(Ordering::Relaxed),
            template_fallback_total: self.template_fallback_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

/// Installs the JSON subscriber once per process. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,tripweave_agents=info,tripweave_maps=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
