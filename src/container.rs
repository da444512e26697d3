//! Continuous container with FIFO get/put queues.
//!
//! Holds a level in `[0, capacity]` and models RAM. `get` takes an amount
//! out, `put` returns it; either side blocks when the level does not allow
//! the operation. Queue draining is head-of-line blocking: a blocked head
//! request holds its queue even if a later, smaller request could be
//! satisfied. That preserves FIFO and rules out starvation inversions.

use std::collections::VecDeque;

use crate::error::{SimError, SimResult};
use crate::kernel::Kernel;
use crate::types::SignalId;

/// A pending get or put request.
#[derive(Debug)]
struct Waiter {
    amount: u64,
    sig: SignalId,
}

/// A container holding a continuous resource.
///
/// # Example
///
/// ```
/// use tasksim::container::Container;
/// use tasksim::kernel::Kernel;
///
/// let mut kernel = Kernel::new();
/// let mut ram = Container::full(1000);
///
/// let grant = ram.get(&mut kernel, 800).unwrap();
/// assert!(kernel.is_triggered(grant));
/// assert_eq!(ram.level(), 200);
///
/// let blocked = ram.get(&mut kernel, 800).unwrap();
/// assert!(!kernel.is_triggered(blocked));
///
/// ram.put(&mut kernel, 800).unwrap();
/// assert!(kernel.is_triggered(blocked));
/// ```
#[derive(Debug)]
pub struct Container {
    capacity: u64,
    level: u64,
    get_waiters: VecDeque<Waiter>,
    put_waiters: VecDeque<Waiter>,
}

impl Container {
    /// Creates a container with the given capacity and initial level.
    ///
    /// # Panics
    /// Panics if `init` exceeds `capacity`.
    pub fn new(capacity: u64, init: u64) -> Self {
        assert!(init <= capacity, "initial level exceeds capacity");
        Self {
            capacity,
            level: init,
            get_waiters: VecDeque::new(),
            put_waiters: VecDeque::new(),
        }
    }

    /// Creates a container that starts full (the RAM case).
    pub fn full(capacity: u64) -> Self {
        Self::new(capacity, capacity)
    }

    /// Takes `amount` out of the container.
    ///
    /// Fails with `InvalidAmount` if the request can never be satisfied;
    /// otherwise returns a signal triggered once the level allows it.
    pub fn get(&mut self, kernel: &mut Kernel, amount: u64) -> SimResult<SignalId> {
        if amount > self.capacity {
            return Err(SimError::InvalidAmount {
                requested: amount,
                capacity: self.capacity,
            });
        }

        let sig = kernel.event();
        if self.level >= amount {
            self.level -= amount;
            kernel.trigger(sig);
            // Lowering the level may unblock a pending put.
            self.drain_puts(kernel);
        } else {
            self.get_waiters.push_back(Waiter { amount, sig });
        }
        Ok(sig)
    }

    /// Puts `amount` back into the container.
    ///
    /// Fails with `InvalidAmount` if the amount alone exceeds the capacity;
    /// otherwise returns a signal triggered once there is room.
    pub fn put(&mut self, kernel: &mut Kernel, amount: u64) -> SimResult<SignalId> {
        if amount > self.capacity {
            return Err(SimError::InvalidAmount {
                requested: amount,
                capacity: self.capacity,
            });
        }

        let sig = kernel.event();
        if self.level + amount <= self.capacity {
            self.level += amount;
            kernel.trigger(sig);
            // Raising the level may unblock a pending get.
            self.drain_gets(kernel);
        } else {
            self.put_waiters.push_back(Waiter { amount, sig });
        }
        Ok(sig)
    }

    /// Returns the current level.
    pub fn level(&self) -> u64 {
        self.level
    }

    /// Returns the capacity.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns the number of queued get requests.
    pub fn get_queue_len(&self) -> usize {
        self.get_waiters.len()
    }

    /// Returns the number of queued put requests.
    pub fn put_queue_len(&self) -> usize {
        self.put_waiters.len()
    }

    fn drain_gets(&mut self, kernel: &mut Kernel) {
        while let Some(head) = self.get_waiters.front() {
            if kernel.is_aborted(head.sig) {
                self.get_waiters.pop_front();
                continue;
            }
            if self.level < head.amount {
                break;
            }
            let head = self.get_waiters.pop_front().unwrap();
            self.level -= head.amount;
            kernel.trigger(head.sig);
        }
    }

    fn drain_puts(&mut self, kernel: &mut Kernel) {
        while let Some(head) = self.put_waiters.front() {
            if kernel.is_aborted(head.sig) {
                self.put_waiters.pop_front();
                continue;
            }
            if self.level + head.amount > self.capacity {
                break;
            }
            let head = self.put_waiters.pop_front().unwrap();
            self.level += head.amount;
            kernel.trigger(head.sig);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_get_and_put() {
        let mut kernel = Kernel::new();
        let mut ram = Container::full(1000);

        let grant = ram.get(&mut kernel, 400).unwrap();
        assert!(kernel.is_triggered(grant));
        assert_eq!(ram.level(), 600);

        let back = ram.put(&mut kernel, 400).unwrap();
        assert!(kernel.is_triggered(back));
        assert_eq!(ram.level(), 1000);
    }

    #[test]
    fn test_zero_amount_never_blocks() {
        let mut kernel = Kernel::new();
        let mut ram = Container::new(100, 0);

        let grant = ram.get(&mut kernel, 0).unwrap();
        assert!(kernel.is_triggered(grant));
        assert_eq!(ram.level(), 0);
    }

    #[test]
    fn test_get_over_capacity_fails() {
        let mut kernel = Kernel::new();
        let mut ram = Container::full(1000);

        let err = ram.get(&mut kernel, 2000).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidAmount {
                requested: 2000,
                capacity: 1000
            }
        ));
        // The failed request left no trace.
        assert_eq!(ram.level(), 1000);
        assert_eq!(ram.get_queue_len(), 0);
    }

    #[test]
    fn test_put_over_capacity_fails() {
        let mut kernel = Kernel::new();
        let mut ram = Container::new(1000, 0);

        let err = ram.put(&mut kernel, 1500).unwrap_err();
        assert!(matches!(err, SimError::InvalidAmount { .. }));
    }

    #[test]
    fn test_blocked_get_unblocks_on_put() {
        let mut kernel = Kernel::new();
        let mut ram = Container::full(1000);

        let first = ram.get(&mut kernel, 800).unwrap();
        let second = ram.get(&mut kernel, 800).unwrap();
        assert!(kernel.is_triggered(first));
        assert!(!kernel.is_triggered(second));
        assert_eq!(ram.get_queue_len(), 1);

        ram.put(&mut kernel, 800).unwrap();
        assert!(kernel.is_triggered(second));
        assert_eq!(ram.level(), 200);
        assert_eq!(ram.get_queue_len(), 0);
    }

    #[test]
    fn test_head_of_line_blocking() {
        let mut kernel = Kernel::new();
        let mut ram = Container::full(1000);

        let _hold = ram.get(&mut kernel, 900).unwrap();
        let big = ram.get(&mut kernel, 500).unwrap();
        let small = ram.get(&mut kernel, 50).unwrap();

        // 100 units are free and would satisfy `small`, but the blocked
        // head request holds the queue.
        ram.put(&mut kernel, 100).unwrap();
        assert!(!kernel.is_triggered(big));
        assert!(!kernel.is_triggered(small));

        ram.put(&mut kernel, 400).unwrap();
        assert!(kernel.is_triggered(big));
        assert!(kernel.is_triggered(small));
    }

    #[test]
    fn test_drain_skips_aborted_gets() {
        let mut kernel = Kernel::new();
        let mut ram = Container::full(1000);

        let _hold = ram.get(&mut kernel, 1000).unwrap();
        let dead = ram.get(&mut kernel, 600).unwrap();
        let live = ram.get(&mut kernel, 600).unwrap();
        kernel.abort(dead);

        ram.put(&mut kernel, 600).unwrap();
        assert!(!kernel.is_triggered(dead));
        assert!(kernel.is_triggered(live));
    }

    #[test]
    fn test_blocked_put_unblocks_on_get() {
        let mut kernel = Kernel::new();
        let mut tank = Container::full(100);

        let blocked = tank.put(&mut kernel, 50).unwrap();
        assert!(!kernel.is_triggered(blocked));
        assert_eq!(tank.put_queue_len(), 1);

        tank.get(&mut kernel, 60).unwrap();
        assert!(kernel.is_triggered(blocked));
        assert_eq!(tank.level(), 90);
        assert_eq!(tank.put_queue_len(), 0);
    }

    #[test]
    fn test_level_stays_within_bounds() {
        let mut kernel = Kernel::new();
        let mut ram = Container::full(500);

        for _ in 0..4 {
            ram.get(&mut kernel, 200).unwrap();
            assert!(ram.level() <= ram.capacity());
            ram.put(&mut kernel, 200).unwrap();
            assert!(ram.level() <= ram.capacity());
        }
        assert_eq!(ram.level(), 500);
    }

    #[test]
    #[should_panic(expected = "initial level exceeds capacity")]
    fn test_init_over_capacity_panics() {
        Container::new(10, 11);
    }
}
