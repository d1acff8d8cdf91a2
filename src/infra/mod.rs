//! Infrastructure: storage for requests waiting on a free connection slot.

pub mod queue;
