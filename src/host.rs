//! Compute host: one CPU resource plus one RAM container.

use tracing::info;

use crate::container::Container;
use crate::resource::Resource;

/// A compute host with CPU cores and RAM.
///
/// The CPU is a seizable resource with one slot per core; the RAM is a
/// container that starts full. Both live for the whole run and are shared
/// by every task process scheduled on the host.
#[derive(Debug)]
pub struct Host {
    /// Host identifier from the experiment configuration.
    pub name: String,
    /// CPU cores as a counted resource.
    pub cpu: Resource,
    /// RAM as a continuous container, initially full.
    pub ram: Container,
    /// Declared number of cores.
    pub cpu_cores: u64,
    /// Declared RAM capacity.
    pub ram_capacity: u64,
}

impl Host {
    /// Creates a host with the given core count and RAM capacity.
    pub fn new(name: impl Into<String>, cpu_cores: u64, ram_capacity: u64) -> Self {
        let name = name.into();
        info!(
            "Host {} initialized: {} CPU cores, {} RAM units",
            name, cpu_cores, ram_capacity
        );
        Self {
            name,
            cpu: Resource::new(cpu_cores),
            ram: Container::full(ram_capacity),
            cpu_cores,
            ram_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Kernel;

    #[test]
    fn test_host_construction() {
        let host = Host::new("HOST_0", 4, 2048);

        assert_eq!(host.name, "HOST_0");
        assert_eq!(host.cpu.capacity(), 4);
        assert_eq!(host.ram.capacity(), 2048);
        assert_eq!(host.ram.level(), 2048);
    }

    #[test]
    fn test_host_resources_are_independent() {
        let mut kernel = Kernel::new();
        let mut host = Host::new("HOST_0", 1, 100);

        let cpu = host.cpu.request(&mut kernel);
        let ram = host.ram.get(&mut kernel, 100).unwrap();

        assert!(kernel.is_triggered(cpu));
        assert!(kernel.is_triggered(ram));
        assert_eq!(host.cpu.in_use(), 1);
        assert_eq!(host.ram.level(), 0);
    }
}
