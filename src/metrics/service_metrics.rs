use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;
use sysinfo::{Pid, System};

// below this many responses the error rate is too noisy to degrade health
const MIN_RESPONSES_FOR_ERROR_RATE: u64 = 20;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthThresholds {
    pub max_memory_mb: u64,
    pub max_cpu_percent: f32,
    pub max_error_rate: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            max_memory_mb: 512,
            max_cpu_percent: 80.0,
            max_error_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub requests: u64,
    pub responses: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub error_rate: f64,
    pub memory_bytes: Option<u64>,
    pub cpu_percent: Option<f32>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub issues: Vec<String>,
    pub uptime_secs: u64,
    pub memory_bytes: Option<u64>,
    pub cpu_percent: Option<f32>,
    pub error_rate: f64,
}

pub struct ServiceMetrics {
    started_at: Instant,
    requests: AtomicU64,
    responses: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests: AtomicU64::new(0),
            responses: AtomicU64::new(0),
            client_errors: AtomicU64::new(0),
            server_errors: AtomicU64::new(0),
            pid: sysinfo::get_current_pid().ok(),
            system: Mutex::new(System::new()),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_response(&self, status: u16) {
        self.responses.fetch_add(1, Ordering::Relaxed);
        if status >= 500 {
            self.server_errors.fetch_add(1, Ordering::Relaxed);
        } else if status >= 400 {
            self.client_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn sample_process(&self) -> (Option<u64>, Option<f32>) {
        let (Some(pid), Ok(mut system)) = (self.pid, self.system.lock()) else {
            return (None, None);
        };
        if !system.refresh_process(pid) {
            return (None, None);
        }
        match system.process(pid) {
            Some(p) => (Some(p.memory()), Some(p.cpu_usage())),
            None => (None, None),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let responses = self.responses.load(Ordering::Relaxed);
        let server_errors = self.server_errors.load(Ordering::Relaxed);
        let (memory_bytes, cpu_percent) = self.sample_process();

        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs(),
            requests: self.requests.load(Ordering::Relaxed),
            responses,
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors,
            error_rate: error_rate(server_errors, responses),
            memory_bytes,
            cpu_percent,
            generated_at: chrono::Utc::now(),
        }
    }

    pub fn health(&self, thresholds: &HealthThresholds) -> HealthReport {
        evaluate(&self.snapshot(), thresholds)
    }
}

fn error_rate(errors: u64, responses: u64) -> f64 {
    if responses == 0 {
        return 0.0;
    }
    errors as f64 / responses as f64
}

pub fn evaluate(snapshot: &MetricsSnapshot, thresholds: &HealthThresholds) -> HealthReport {
    let mut issues = Vec::new();

    if let Some(bytes) = snapshot.memory_bytes {
        let mb = bytes / (1024 * 1024);
        if mb > thresholds.max_memory_mb {
            issues.push(format!("memory {}MB above {}MB", mb, thresholds.max_memory_mb));
        }
    }
    if let Some(cpu) = snapshot.cpu_percent {
        if cpu > thresholds.max_cpu_percent {
            issues.push(format!("cpu {:.1}% above {:.1}%", cpu, thresholds.max_cpu_percent));
        }
    }
    if snapshot.responses >= MIN_RESPONSES_FOR_ERROR_RATE && snapshot.error_rate > thresholds.max_error_rate {
        issues.push(format!(
            "error rate {:.3} above {:.3}",
            snapshot.error_rate, thresholds.max_error_rate
        ));
    }

    HealthReport {
        status: if issues.is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        issues,
        uptime_secs: snapshot.uptime_secs,
        memory_bytes: snapshot.memory_bytes,
        cpu_percent: snapshot.cpu_percent,
        error_rate: snapshot.error_rate,
    }
}
