//! Derived link graph and its traversal queries.

pub mod tracker;

pub use tracker::{Cycle, DependencyTracker, Direction, Edge};
