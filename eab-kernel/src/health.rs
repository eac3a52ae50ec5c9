use crate::store::TelemetryStore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Serialize, Deserialize)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub hosts_tracked: u64,
    pub detections_logged: u64,
    pub bans_recorded: u64,
    pub webhook: String,
    pub alerts_delivered: u64,
    pub alerts_failed: u64,
    pub memory_usage_mb: f32,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    alerts_delivered: Arc<AtomicU64>,
    alerts_failed: Arc<AtomicU64>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            alerts_delivered: Arc::new(AtomicU64::new(0)),
            alerts_failed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn mark_alert_delivered(&self) {
        self.alerts_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_alert_failed(&self) {
        self.alerts_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn alerts_delivered(&self) -> u64 {
        self.alerts_delivered.load(Ordering::Relaxed)
    }

    pub fn alerts_failed(&self) -> u64 {
        self.alerts_failed.load(Ordering::Relaxed)
    }

    pub fn get_health(&self, store: &TelemetryStore, webhook_enabled: bool) -> KernelHealth {
        KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            hosts_tracked: store.hosts_tracked() as u64,
            detections_logged: store.detections_logged() as u64,
            bans_recorded: store.bans_recorded() as u64,
            webhook: if webhook_enabled { "enabled" } else { "disabled" }.to_string(),
            alerts_delivered: self.alerts_delivered(),
            alerts_failed: self.alerts_failed(),
            memory_usage_mb: get_memory_usage_mb(),
        }
    }
}

fn get_memory_usage_mb() -> f32 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|l| l.starts_with("VmRSS:"))
                .and_then(|l| l.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<u64>().ok());
            if let Some(kb) = rss_kb {
                return kb as f32 / 1024.0; // KB -> MB
            }
        }
    }

    // pas de /proc : inconnu
    0.0
}
