//! Core type definitions for the simulator.
//!
//! This module defines the fundamental types used throughout the engine.

/// Virtual simulation time.
///
/// The clock only advances when the event queue dictates; all timeouts and
/// wakeups use the same `SimTime` representation.
pub type SimTime = u64;

/// Index of a task in the simulator's task table.
///
/// Task names are resolved to indices once at construction time; the inner
/// loops use index-keyed vectors, never name-keyed maps.
pub type TaskId = usize;

/// Index of a host in the simulator's host table.
///
/// Hosts are stored sorted by host id, so the index order is stable across
/// runs of the same experiment.
pub type HostId = usize;

/// Handle to a one-shot signal in the kernel's signal arena.
pub type SignalId = usize;
