//! Parallel execution of windows on a worker pool
pub mod scheduler;
