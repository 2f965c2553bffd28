use std::path::PathBuf;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};

/// A snapshot of host resource usage, in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    /// Unix timestamp in seconds of when the sample was captured
    pub timestamp: i64,
}

impl Sample {
    /// Reads every metric from the sampler. A metric that can't be read is reported as 0.
    pub fn take(sampler: &dyn Sampler) -> Self {
        Self {
            cpu_usage: sampler.cpu_percent().unwrap_or_default(),
            memory_usage: sampler.memory_percent().unwrap_or_default(),
            disk_usage: sampler.disk_percent().unwrap_or_default(),
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn zeroed() -> Self {
        Self {
            cpu_usage: 0.,
            memory_usage: 0.,
            disk_usage: 0.,
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "cpu_usage": self.cpu_usage,
            "memory_usage": self.memory_usage,
            "disk_usage": self.disk_usage,
            "timestamp": self.timestamp,
        })
    }
}

/// Reads host resource usage. Readings may block, and return [None] when they fail.
pub trait Sampler: Send + Sync {
    fn cpu_percent(&self) -> Option<f64>;
    fn memory_percent(&self) -> Option<f64>;
    fn disk_percent(&self) -> Option<f64>;
}

/// Samples the machine the process runs on
pub struct SystemSampler {
    system: Mutex<System>,
    /// The mount point of the disk to report
    mount_point: PathBuf,
}

impl SystemSampler {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            mount_point: PathBuf::from("/"),
        }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(used: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }

    Some(used as f64 / total as f64 * 100.)
}

impl Sampler for SystemSampler {
    fn cpu_percent(&self) -> Option<f64> {
        let mut system = self.system.lock();

        // Usage is computed from the difference between two refreshes
        system.refresh_cpu_usage();
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu_usage();

        let usage = system.global_cpu_usage() as f64;
        usage.is_finite().then_some(usage)
    }

    fn memory_percent(&self) -> Option<f64> {
        let mut system = self.system.lock();
        system.refresh_memory();

        percent(system.used_memory(), system.total_memory())
    }

    fn disk_percent(&self) -> Option<f64> {
        let disks = Disks::new_with_refreshed_list();

        let disk = disks
            .iter()
            .find(|d| d.mount_point() == self.mount_point.as_path())
            .or_else(|| disks.iter().next())?;

        let total = disk.total_space();
        let used = total.saturating_sub(disk.available_space());

        percent(used, total)
    }
}
