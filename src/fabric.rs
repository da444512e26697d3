//! Network fabric: directional links between host pairs.
//!
//! One capacity-1 seizable resource exists for every ordered pair of
//! distinct hosts; self-pairs are absent. Intra-host transfers never touch
//! the fabric. The table is a dense vector indexed by
//! `from * host_count + to`, so lookups in the task loop are plain
//! arithmetic on host indices.

use tracing::info;

use crate::error::{SimError, SimResult};
use crate::resource::Resource;
use crate::types::HostId;

/// The link table over a fixed host set.
#[derive(Debug)]
pub struct Fabric {
    host_count: usize,
    links: Vec<Option<Resource>>,
}

impl Fabric {
    /// Builds links between every ordered pair of distinct hosts.
    pub fn new(host_count: usize) -> Self {
        let mut links = Vec::with_capacity(host_count * host_count);
        for from in 0..host_count {
            for to in 0..host_count {
                links.push(if from == to {
                    None
                } else {
                    Some(Resource::new(1))
                });
            }
        }
        let link_count = host_count.saturating_mul(host_count.saturating_sub(1));
        info!(
            "Network initialized with {} directional links for {} hosts",
            link_count, host_count
        );
        Self { host_count, links }
    }

    /// Returns the number of directional links.
    pub fn link_count(&self) -> usize {
        self.host_count * self.host_count.saturating_sub(1)
    }

    /// Returns the link for the given direction.
    ///
    /// Fails with `UnknownLink` for self-pairs and out-of-range indices;
    /// after validation this cannot happen for well-formed tasks.
    pub fn link_mut(&mut self, from: HostId, to: HostId) -> SimResult<&mut Resource> {
        if from >= self.host_count || to >= self.host_count {
            return Err(SimError::UnknownLink {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.links[from * self.host_count + to]
            .as_mut()
            .ok_or(SimError::UnknownLink {
                from: from.to_string(),
                to: to.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Kernel;

    #[test]
    fn test_link_count() {
        assert_eq!(Fabric::new(0).link_count(), 0);
        assert_eq!(Fabric::new(1).link_count(), 0);
        assert_eq!(Fabric::new(2).link_count(), 2);
        assert_eq!(Fabric::new(4).link_count(), 12);
    }

    #[test]
    fn test_directions_are_independent() {
        let mut kernel = Kernel::new();
        let mut fabric = Fabric::new(2);

        let forward = fabric.link_mut(0, 1).unwrap().request(&mut kernel);
        let backward = fabric.link_mut(1, 0).unwrap().request(&mut kernel);

        // Both directions granted: they are distinct capacity-1 resources.
        assert!(kernel.is_triggered(forward));
        assert!(kernel.is_triggered(backward));
    }

    #[test]
    fn test_link_is_capacity_one() {
        let mut kernel = Kernel::new();
        let mut fabric = Fabric::new(2);

        let link = fabric.link_mut(0, 1).unwrap();
        let first = link.request(&mut kernel);
        let second = link.request(&mut kernel);

        assert!(kernel.is_triggered(first));
        assert!(!kernel.is_triggered(second));
    }

    #[test]
    fn test_self_pair_is_unknown() {
        let mut fabric = Fabric::new(3);
        assert!(matches!(
            fabric.link_mut(1, 1),
            Err(SimError::UnknownLink { .. })
        ));
    }

    #[test]
    fn test_out_of_range_is_unknown() {
        let mut fabric = Fabric::new(2);
        assert!(matches!(
            fabric.link_mut(0, 5),
            Err(SimError::UnknownLink { .. })
        ));
    }
}
