//! The simulation driver.
//!
//! Wires hosts, the network fabric, and one completion signal per task;
//! spawns a process per task; drives the virtual clock until the event
//! queue is empty; and computes the utilization report.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::ExperimentConfig;
use crate::error::{SimError, SimResult};
use crate::fabric::Fabric;
use crate::host::Host;
use crate::kernel::Kernel;
use crate::process::{Phase, TaskProcess};
use crate::stats::{utilization, HostReport, SimulationReport, TaskReport};
use crate::task::Task;
use crate::types::{SignalId, SimTime};

/// Simulates dependent tasks on a fleet of hosts.
///
/// # Example
///
/// ```
/// use tasksim::config::ExperimentConfig;
/// use tasksim::simulator::Simulator;
/// use tasksim::task::Task;
///
/// let config = ExperimentConfig::new().with_host("H", 1, 1000);
/// let tasks = vec![Task::new("A", "H").run_for(10).with_ram(100)];
///
/// let mut sim = Simulator::new(&config, tasks).unwrap();
/// let report = sim.run(false).unwrap();
/// assert_eq!(report.sim_time, 10);
/// ```
#[derive(Debug)]
pub struct Simulator {
    pub(crate) kernel: Kernel,
    pub(crate) tasks: Vec<Task>,
    pub(crate) procs: Vec<TaskProcess>,
    pub(crate) hosts: Vec<Host>,
    pub(crate) fabric: Fabric,
    pub(crate) completion: Vec<SignalId>,
}

impl Simulator {
    /// Builds a simulator from an experiment configuration and a task list.
    ///
    /// Hosts are constructed in sorted host-id order; task hosts and
    /// dependency names are resolved to indices exactly once here. A task
    /// whose RAM exceeds its host's capacity fails immediately with
    /// `InvalidAmount` instead of deadlocking inside the run.
    pub fn new(config: &ExperimentConfig, mut tasks: Vec<Task>) -> SimResult<Self> {
        config.validate()?;

        let mut kernel = Kernel::new();

        let hosts: Vec<Host> = config
            .hosts
            .iter()
            .map(|(id, hc)| Host::new(id.clone(), hc.cpu_cores, hc.ram))
            .collect();
        let host_index: HashMap<&str, usize> = hosts
            .iter()
            .enumerate()
            .map(|(i, h)| (h.name.as_str(), i))
            .collect();

        let task_index: HashMap<String, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();

        for task in &mut tasks {
            let host = *host_index
                .get(task.host.as_str())
                .ok_or_else(|| SimError::UnknownHost {
                    task: task.name.clone(),
                    host: task.host.clone(),
                })?;
            task.host_index = host;

            if task.ram > hosts[host].ram_capacity {
                return Err(SimError::InvalidAmount {
                    requested: task.ram,
                    capacity: hosts[host].ram_capacity,
                });
            }

            task.dependency_indices = task
                .dependencies
                .iter()
                .map(|dep| {
                    task_index.get(dep).copied().ok_or_else(|| {
                        SimError::Validation(format!(
                            "task '{}' has undefined dependency: '{}'",
                            task.name, dep
                        ))
                    })
                })
                .collect::<SimResult<Vec<_>>>()?;
        }

        let fabric = Fabric::new(hosts.len());
        let completion = tasks.iter().map(|_| kernel.event()).collect();
        let procs = tasks.iter().map(|_| TaskProcess::new()).collect();

        Ok(Self {
            kernel,
            tasks,
            procs,
            hosts,
            fabric,
            completion,
        })
    }

    /// Returns the current virtual time.
    pub fn now(&self) -> SimTime {
        self.kernel.now()
    }

    /// Runs the simulation until all tasks complete.
    ///
    /// Spawns one process per task in task list order (the tie-break for
    /// everything racing at t = 0), drains the event queue, and returns the
    /// statistics report. With `verbose` the summary includes per-host
    /// metrics.
    pub fn run(&mut self, verbose: bool) -> SimResult<SimulationReport> {
        info!("======================================================================");
        info!("Starting simulation with {} tasks", self.tasks.len());
        info!("======================================================================");

        for pid in 0..self.tasks.len() {
            self.kernel.spawn(pid);
        }

        while let Some(pid) = self.kernel.next_process() {
            self.step_process(pid)?;
        }

        for (pid, process) in self.procs.iter().enumerate() {
            if process.phase != Phase::Done {
                warn!(
                    "Task {} never completed (stuck in {:?})",
                    self.tasks[pid].name, process.phase
                );
            }
        }

        let report = self.report();

        info!("======================================================================");
        info!("Simulation completed at t={}", report.sim_time);
        info!("======================================================================");
        report.log_summary(verbose);

        Ok(report)
    }

    fn report(&self) -> SimulationReport {
        let sim_time = self.kernel.now();

        let mut work_per_host = vec![0u64; self.hosts.len()];
        let mut total_cpu_work = 0u64;
        for task in &self.tasks {
            total_cpu_work += task.run_time;
            work_per_host[task.host_index] += task.run_time;
        }

        let hosts: Vec<HostReport> = self
            .hosts
            .iter()
            .zip(&work_per_host)
            .map(|(host, &work)| {
                let available = host.cpu_cores * sim_time;
                HostReport {
                    name: host.name.clone(),
                    cpu_cores: host.cpu_cores,
                    cpu_work: work,
                    cpu_available: available,
                    cpu_idle: available - work,
                    utilization: utilization(work, available),
                }
            })
            .collect();

        let total_cpu_cores: u64 = self.hosts.iter().map(|h| h.cpu_cores).sum();
        let total_cpu_available = total_cpu_cores * sim_time;

        let tasks: Vec<TaskReport> = self
            .tasks
            .iter()
            .zip(&self.procs)
            .map(|(task, process)| TaskReport {
                name: task.name.clone(),
                host: task.host.clone(),
                start_time: process.start_time.unwrap_or_default(),
                finish_time: process.finish_time.unwrap_or_default(),
            })
            .collect();

        SimulationReport {
            sim_time,
            total_cpu_cores,
            total_cpu_work,
            total_cpu_available,
            total_cpu_idle: total_cpu_available - total_cpu_work,
            cpu_utilization: utilization(total_cpu_work, total_cpu_available),
            hosts,
            tasks,
        }
    }
}
