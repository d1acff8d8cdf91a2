//! Waiting-queue backends.

pub mod sorted;

pub use sorted::{insertion_index, insertion_index_by, Prioritized, PriorityQueue};
