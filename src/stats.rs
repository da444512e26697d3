//! Completion-time and CPU-utilization statistics for a finished run.
//!
//! The report is computed once after the event queue drains and carries
//! overall metrics, per-host metrics in host-id order, and per-task start
//! and finish times.

use serde::Serialize;
use tracing::info;

use crate::types::SimTime;

/// CPU accounting for a single host.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HostReport {
    /// Host identifier.
    pub name: String,
    /// Number of CPU cores.
    pub cpu_cores: u64,
    /// Sum of run times of tasks scheduled on this host.
    pub cpu_work: u64,
    /// `cpu_cores * sim_time`.
    pub cpu_available: u64,
    /// `cpu_available - cpu_work`.
    pub cpu_idle: u64,
    /// `cpu_work / cpu_available` as a percentage; 0 when nothing was
    /// available.
    pub utilization: f64,
}

/// Start and finish virtual times of one task.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskReport {
    /// Task name.
    pub name: String,
    /// Host the task ran on.
    pub host: String,
    /// Virtual time at which the task acquired its CPU core.
    pub start_time: SimTime,
    /// Virtual time at which the task signalled completion.
    pub finish_time: SimTime,
}

/// Aggregate statistics for a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationReport {
    /// Virtual time when the event queue drained.
    pub sim_time: SimTime,
    /// Total CPU cores across all hosts.
    pub total_cpu_cores: u64,
    /// Sum of all task run times.
    pub total_cpu_work: u64,
    /// `total_cpu_cores * sim_time`.
    pub total_cpu_available: u64,
    /// `total_cpu_available - total_cpu_work`.
    pub total_cpu_idle: u64,
    /// Overall utilization as a percentage.
    pub cpu_utilization: f64,
    /// Per-host metrics in host-id order.
    pub hosts: Vec<HostReport>,
    /// Per-task timings in task list order.
    pub tasks: Vec<TaskReport>,
}

impl SimulationReport {
    /// Exports the report as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("report serialization cannot fail")
    }

    /// Logs the summary block on the info channel.
    ///
    /// With `verbose`, additionally logs per-host statistics and the
    /// CPU-available breakdown.
    pub fn log_summary(&self, verbose: bool) {
        if verbose {
            info!("");
            info!("Host Statistics:");
            info!("----------------------------------------------------------------------");
            for host in &self.hosts {
                info!("{} ({} cores):", host.name, host.cpu_cores);
                info!("  CPU work time:      {}", host.cpu_work);
                info!(
                    "  CPU available time: {} ({} cores x {})",
                    host.cpu_available, host.cpu_cores, self.sim_time
                );
                info!("  CPU idle time:      {}", host.cpu_idle);
                info!("  CPU utilization:    {:.2}%", host.utilization);
            }
            info!("----------------------------------------------------------------------");
        }

        info!("");
        info!("Overall Statistics:");
        info!("----------------------------------------------------------------------");
        info!("Total CPU cores:        {}", self.total_cpu_cores);
        info!("Total CPU work time:    {}", self.total_cpu_work);
        if verbose {
            info!("Total CPU available:    {}", self.total_cpu_available);
            info!("  Breakdown:");
            for host in &self.hosts {
                info!(
                    "    {}: {} cores x {} = {}",
                    host.name, host.cpu_cores, self.sim_time, host.cpu_available
                );
            }
        } else {
            info!(
                "Total CPU available:    {} ({} cores x {})",
                self.total_cpu_available, self.total_cpu_cores, self.sim_time
            );
        }
        info!("Total CPU idle time:    {}", self.total_cpu_idle);
        info!("CPU utilization:        {:.2}%", self.cpu_utilization);
        info!("======================================================================");
    }
}

/// Computes a utilization percentage, treating an empty denominator as 0.
pub(crate) fn utilization(work: u64, available: u64) -> f64 {
    if available > 0 {
        work as f64 / available as f64 * 100.0
    } else {
        0.0
    }
}
