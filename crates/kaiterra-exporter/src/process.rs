//! Process and build metrics served alongside the sensor gauges.
//!
//! Sampled fresh on every scrape; nothing is cached between scrapes.

use sysinfo::{Pid, ProcessesToUpdate, System};

use kaiterra_common::metrics::{MetricFamily, MetricType, Sample};

pub const BUILD_INFO: &str = "kaiterra_exporter_build_info";

/// Collects runtime metrics for the current process.
#[derive(Debug, Clone)]
pub struct ProcessCollector {
    pid: Option<Pid>,
}

impl ProcessCollector {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = e, "process metrics unavailable");
                None
            }
        };
        Self { pid }
    }

    pub fn collect(&self) -> Vec<MetricFamily> {
        let mut families = Vec::with_capacity(7);

        if let Some(pid) = self.pid {
            let mut sys = System::new();
            sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            if let Some(p) = sys.process(pid) {
                families.push(MetricFamily::counter(
                    "process_cpu_seconds_total",
                    "Total user and system CPU time spent in seconds.",
                    p.accumulated_cpu_time() as f64 / 1000.0,
                ));
                families.push(MetricFamily::gauge(
                    "process_resident_memory_bytes",
                    "Resident memory size in bytes.",
                    p.memory() as f64,
                ));
                families.push(MetricFamily::gauge(
                    "process_virtual_memory_bytes",
                    "Virtual memory size in bytes.",
                    p.virtual_memory() as f64,
                ));
                families.push(MetricFamily::gauge(
                    "process_start_time_seconds",
                    "Start time of the process since unix epoch in seconds.",
                    p.start_time() as f64,
                ));
            }
        }

        if let Some(fds) = open_fds() {
            families.push(MetricFamily::gauge(
                "process_open_fds",
                "Number of open file descriptors.",
                fds as f64,
            ));
        }

        if let Some(limits) = read_limits() {
            if let Some(max_fds) = limits.max_open_files {
                families.push(MetricFamily::gauge(
                    "process_max_fds",
                    "Maximum number of open file descriptors.",
                    max_fds,
                ));
            }
            if let Some(max_vm) = limits.max_address_space {
                families.push(MetricFamily::gauge(
                    "process_virtual_memory_max_bytes",
                    "Maximum amount of virtual memory available in bytes.",
                    max_vm,
                ));
            }
        }

        families
    }
}

impl Default for ProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// `kaiterra_exporter_build_info{version="..."} 1`
pub fn build_info() -> MetricFamily {
    MetricFamily {
        name: BUILD_INFO,
        help: "Build information about the exporter binary.",
        kind: MetricType::Gauge,
        samples: vec![Sample {
            labels: vec![
                ("version", env!("CARGO_PKG_VERSION").into()),
                ("name", env!("CARGO_PKG_NAME").into()),
            ],
            value: 1.0,
        }],
    }
}

#[cfg(target_os = "linux")]
fn open_fds() -> Option<usize> {
    std::fs::read_dir("/proc/self/fd").ok().map(|d| d.count())
}

#[cfg(not(target_os = "linux"))]
fn open_fds() -> Option<usize> {
    None
}

/// Soft resource limits of the current process.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Limits {
    max_open_files: Option<f64>,
    max_address_space: Option<f64>,
}

#[cfg(target_os = "linux")]
fn read_limits() -> Option<Limits> {
    std::fs::read_to_string("/proc/self/limits")
        .ok()
        .map(|s| parse_limits(&s))
}

#[cfg(not(target_os = "linux"))]
fn read_limits() -> Option<Limits> {
    None
}

/// Parse the soft-limit column of `/proc/<pid>/limits`.
///
/// `unlimited` is reported as `u64::MAX`, as Go's process collector does.
fn parse_limits(text: &str) -> Limits {
    let mut limits = Limits::default();
    for line in text.lines() {
        let (target, rest) = if let Some(rest) = line.strip_prefix("Max open files") {
            (&mut limits.max_open_files, rest)
        } else if let Some(rest) = line.strip_prefix("Max address space") {
            (&mut limits.max_address_space, rest)
        } else {
            continue;
        };
        *target = match rest.split_whitespace().next() {
            Some("unlimited") => Some(u64::MAX as f64),
            Some(v) => v.parse::<u64>().ok().map(|n| n as f64),
            None => None,
        };
    }
    limits
}
