//! Task model and dependency validation.
//!
//! A task is an indivisible unit of work: it sleeps, waits for its
//! dependencies, pays network transfer for cross-host inputs, takes RAM and
//! a CPU core, runs, and releases everything. Tasks are created once by the
//! loader and immutable thereafter; the simulator resolves names to indices
//! at construction time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::types::{HostId, SimTime, TaskId};

/// A task to be executed on a host.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    /// Unique task name.
    pub name: String,
    /// Host identifier the task runs on.
    pub host: String,
    /// Virtual time to sleep before doing anything else.
    pub initial_sleep_time: SimTime,
    /// Virtual time the task occupies a CPU core.
    pub run_time: SimTime,
    /// RAM units held from acquisition until completion.
    pub ram: u64,
    /// Transfer time consumers on other hosts pay for this task's output.
    pub network_time: SimTime,
    /// Names of tasks that must complete first, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Resolved host index; filled by the simulator.
    #[serde(skip)]
    pub host_index: HostId,
    /// Resolved dependency indices; filled by the simulator.
    #[serde(skip)]
    pub dependency_indices: Vec<TaskId>,
}

impl Task {
    /// Creates a task with zero times, zero RAM, and no dependencies.
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            initial_sleep_time: 0,
            run_time: 0,
            ram: 0,
            network_time: 0,
            dependencies: Vec::new(),
            host_index: 0,
            dependency_indices: Vec::new(),
        }
    }

    /// Sets the initial sleep time.
    pub fn sleep(mut self, time: SimTime) -> Self {
        self.initial_sleep_time = time;
        self
    }

    /// Sets the run time.
    pub fn run_for(mut self, time: SimTime) -> Self {
        self.run_time = time;
        self
    }

    /// Sets the RAM requirement.
    pub fn with_ram(mut self, ram: u64) -> Self {
        self.ram = ram;
        self
    }

    /// Sets the output transfer time.
    pub fn with_network_time(mut self, time: SimTime) -> Self {
        self.network_time = time;
        self
    }

    /// Adds a dependency by name.
    pub fn after(mut self, dep: impl Into<String>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    /// Returns true if the task has at least one dependency.
    pub fn has_dependency(&self) -> bool {
        !self.dependency_indices.is_empty()
    }
}

/// Validates the dependency graph of a task set.
///
/// Rejects duplicate task names, undefined dependencies, self-loops, and
/// cycles (DFS with a recursion stack). Must run before the simulator is
/// built; the engine itself assumes a DAG.
pub fn validate_dependencies(tasks: &[Task]) -> SimResult<()> {
    let mut index: HashMap<&str, TaskId> = HashMap::with_capacity(tasks.len());
    for (i, task) in tasks.iter().enumerate() {
        if index.insert(task.name.as_str(), i).is_some() {
            return Err(SimError::Validation(format!(
                "duplicate task name '{}'",
                task.name
            )));
        }
    }

    for task in tasks {
        for dep in &task.dependencies {
            if dep == &task.name {
                return Err(SimError::Validation(format!(
                    "task '{}' depends on itself",
                    task.name
                )));
            }
            if !index.contains_key(dep.as_str()) {
                return Err(SimError::Validation(format!(
                    "task '{}' has undefined dependency: '{}'",
                    task.name, dep
                )));
            }
        }
    }

    let mut visited = vec![false; tasks.len()];
    let mut on_stack = vec![false; tasks.len()];
    for start in 0..tasks.len() {
        if !visited[start] && has_cycle(start, tasks, &index, &mut visited, &mut on_stack) {
            return Err(SimError::Validation(format!(
                "circular dependency detected involving task '{}'",
                tasks[start].name
            )));
        }
    }
    Ok(())
}

fn has_cycle(
    current: TaskId,
    tasks: &[Task],
    index: &HashMap<&str, TaskId>,
    visited: &mut [bool],
    on_stack: &mut [bool],
) -> bool {
    visited[current] = true;
    on_stack[current] = true;

    for dep in &tasks[current].dependencies {
        let next = index[dep.as_str()];
        if !visited[next] {
            if has_cycle(next, tasks, index, visited, on_stack) {
                return true;
            }
        } else if on_stack[next] {
            return true;
        }
    }

    on_stack[current] = false;
    false
}
