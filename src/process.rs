//! The task lifecycle as an explicit state machine.
//!
//! Each task runs as a cooperative process that suspends only at timeouts
//! and signal awaits. The phases, in order: initial sleep, dependency
//! barrier (declaration order), sequential network transfer per cross-host
//! dependency, RAM acquisition, CPU acquisition, execution, release and
//! completion. A process suspends by subscribing to exactly one signal and
//! returning; when the kernel hands it back, the phase tells it what the
//! completed wait was.

use tracing::{debug, info};

use crate::error::SimResult;
use crate::simulator::Simulator;
use crate::types::{SignalId, SimTime, TaskId};

/// Where a task process currently is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Not yet started.
    Created,
    /// In the initial sleep.
    Sleeping { wait: SignalId },
    /// Awaiting the completion signal of dependency number `next`.
    WaitingDeps { next: usize },
    /// Scanning for the next dependency that needs a network transfer,
    /// starting at `dep_pos`.
    Transfers { dep_pos: usize },
    /// Queued on the network link for dependency number `dep_pos`.
    WaitingLink { dep_pos: usize, wait: SignalId },
    /// Occupying the link while the transfer runs.
    Transferring { dep_pos: usize, wait: SignalId },
    /// Queued on the host's RAM container.
    WaitingRam { wait: SignalId },
    /// Queued on the host's CPU resource.
    WaitingCpu { wait: SignalId },
    /// Holding a core for the task's run time.
    Running { wait: SignalId },
    /// Finished; the completion signal has been triggered.
    Done,
}

/// Per-task process state tracked by the simulator.
#[derive(Debug)]
pub(crate) struct TaskProcess {
    pub(crate) phase: Phase,
    pub(crate) start_time: Option<SimTime>,
    pub(crate) finish_time: Option<SimTime>,
}

impl TaskProcess {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Created,
            start_time: None,
            finish_time: None,
        }
    }
}

impl Simulator {
    /// Advances one task process as far as it can go without suspending.
    ///
    /// Called by the run loop whenever the kernel resumes the process.
    /// Every waiting phase is entered through `park`, which either observes
    /// the signal already triggered (the process continues within the same
    /// virtual instant) or subscribes and suspends. An arm matching a
    /// waiting phase therefore means that wait has completed.
    pub(crate) fn step_process(&mut self, pid: TaskId) -> SimResult<()> {
        loop {
            match self.procs[pid].phase {
                Phase::Created => {
                    let sleep = self.tasks[pid].initial_sleep_time;
                    if sleep > 0 {
                        debug!(
                            "[{}]\t[t={}]\tTask {}: Sleeping for {} time units",
                            self.tasks[pid].host,
                            self.kernel.now(),
                            self.tasks[pid].name,
                            sleep
                        );
                        let wait = self.kernel.timeout(sleep);
                        self.procs[pid].phase = Phase::Sleeping { wait };
                        if self.park(pid, wait) {
                            return Ok(());
                        }
                    } else {
                        self.procs[pid].phase = Phase::WaitingDeps { next: 0 };
                    }
                }

                Phase::Sleeping { .. } => {
                    self.procs[pid].phase = Phase::WaitingDeps { next: 0 };
                }

                Phase::WaitingDeps { next } => {
                    if next >= self.tasks[pid].dependency_indices.len() {
                        self.procs[pid].phase = Phase::Transfers { dep_pos: 0 };
                        continue;
                    }
                    let dep = self.tasks[pid].dependency_indices[next];
                    let sig = self.completion[dep];
                    if self.kernel.is_triggered(sig) {
                        self.procs[pid].phase = Phase::WaitingDeps { next: next + 1 };
                        continue;
                    }
                    debug!(
                        "[{}]\t[t={}]\tTask {}: Waiting for dependency {}",
                        self.tasks[pid].host,
                        self.kernel.now(),
                        self.tasks[pid].name,
                        self.tasks[dep].name
                    );
                    self.kernel.subscribe(sig, pid);
                    return Ok(());
                }

                Phase::Transfers { dep_pos } => {
                    let my_host = self.tasks[pid].host_index;
                    let next_transfer = self.tasks[pid].dependency_indices[dep_pos..]
                        .iter()
                        .position(|&dep| {
                            self.tasks[dep].host_index != my_host
                                && self.tasks[dep].network_time > 0
                        })
                        .map(|offset| dep_pos + offset);

                    match next_transfer {
                        Some(pos) => {
                            let dep = self.tasks[pid].dependency_indices[pos];
                            debug!(
                                "[{}]\t[t={}]\tTask {}: Waiting for network transmission from {} ({} time units)",
                                self.tasks[pid].host,
                                self.kernel.now(),
                                self.tasks[pid].name,
                                self.tasks[dep].name,
                                self.tasks[dep].network_time
                            );
                            let from = self.tasks[dep].host_index;
                            let wait =
                                self.fabric.link_mut(from, my_host)?.request(&mut self.kernel);
                            self.procs[pid].phase = Phase::WaitingLink { dep_pos: pos, wait };
                            if self.park(pid, wait) {
                                return Ok(());
                            }
                        }
                        None => {
                            debug!(
                                "[{}]\t[t={}]\tTask {}: Ready to execute",
                                self.tasks[pid].host,
                                self.kernel.now(),
                                self.tasks[pid].name
                            );
                            let amount = self.tasks[pid].ram;
                            debug!(
                                "[{}]\t[t={}]\tTask {}: Waiting for {} RAM units",
                                self.tasks[pid].host,
                                self.kernel.now(),
                                self.tasks[pid].name,
                                amount
                            );
                            let wait =
                                self.hosts[my_host].ram.get(&mut self.kernel, amount)?;
                            self.procs[pid].phase = Phase::WaitingRam { wait };
                            if self.park(pid, wait) {
                                return Ok(());
                            }
                        }
                    }
                }

                Phase::WaitingLink { dep_pos, .. } => {
                    let dep = self.tasks[pid].dependency_indices[dep_pos];
                    debug!(
                        "[NETWORK]\t[t={}]\tTransmission started: {} -> {} ({} time units)",
                        self.kernel.now(),
                        self.tasks[dep].host,
                        self.tasks[pid].host,
                        self.tasks[dep].network_time
                    );
                    let wait = self.kernel.timeout(self.tasks[dep].network_time);
                    self.procs[pid].phase = Phase::Transferring { dep_pos, wait };
                    if self.park(pid, wait) {
                        return Ok(());
                    }
                }

                Phase::Transferring { dep_pos, .. } => {
                    let dep = self.tasks[pid].dependency_indices[dep_pos];
                    debug!(
                        "[NETWORK]\t[t={}]\tTransmission completed: {} -> {}",
                        self.kernel.now(),
                        self.tasks[dep].host,
                        self.tasks[pid].host
                    );
                    let from = self.tasks[dep].host_index;
                    let to = self.tasks[pid].host_index;
                    self.fabric.link_mut(from, to)?.release(&mut self.kernel);
                    self.procs[pid].phase = Phase::Transfers {
                        dep_pos: dep_pos + 1,
                    };
                }

                Phase::WaitingRam { .. } => {
                    debug!(
                        "[{}]\t[t={}]\tTask {}: Waiting for CPU core",
                        self.tasks[pid].host,
                        self.kernel.now(),
                        self.tasks[pid].name
                    );
                    let host = self.tasks[pid].host_index;
                    let wait = self.hosts[host].cpu.request(&mut self.kernel);
                    self.procs[pid].phase = Phase::WaitingCpu { wait };
                    if self.park(pid, wait) {
                        return Ok(());
                    }
                }

                Phase::WaitingCpu { .. } => {
                    self.procs[pid].start_time = Some(self.kernel.now());
                    info!(
                        "[{}]\t[t={}]\tTask {}: Started execution (CPU acquired, {} RAM allocated)",
                        self.tasks[pid].host,
                        self.kernel.now(),
                        self.tasks[pid].name,
                        self.tasks[pid].ram
                    );
                    let wait = self.kernel.timeout(self.tasks[pid].run_time);
                    self.procs[pid].phase = Phase::Running { wait };
                    if self.park(pid, wait) {
                        return Ok(());
                    }
                }

                Phase::Running { .. } => {
                    info!(
                        "[{}]\t[t={}]\tTask {}: Finished execution",
                        self.tasks[pid].host,
                        self.kernel.now(),
                        self.tasks[pid].name
                    );
                    let host = self.tasks[pid].host_index;
                    let amount = self.tasks[pid].ram;
                    self.hosts[host].cpu.release(&mut self.kernel);
                    let put = self.hosts[host].ram.put(&mut self.kernel, amount)?;
                    // A put of what we took out always fits.
                    debug_assert!(self.kernel.is_triggered(put));
                    debug!(
                        "[{}]\t[t={}]\tTask {}: Released {} RAM units",
                        self.tasks[pid].host,
                        self.kernel.now(),
                        self.tasks[pid].name,
                        amount
                    );
                    self.procs[pid].finish_time = Some(self.kernel.now());
                    self.kernel.trigger(self.completion[pid]);
                    self.procs[pid].phase = Phase::Done;
                    return Ok(());
                }

                Phase::Done => {
                    debug_assert!(false, "resumed a finished process");
                    return Ok(());
                }
            }
        }
    }

    /// Parks the process on a pending signal.
    ///
    /// Returns true if the process suspended; false means the signal was
    /// already triggered and the caller continues within the same instant.
    fn park(&mut self, pid: TaskId, wait: SignalId) -> bool {
        if self.kernel.is_triggered(wait) {
            false
        } else {
            self.kernel.subscribe(wait, pid);
            true
        }
    }
}
