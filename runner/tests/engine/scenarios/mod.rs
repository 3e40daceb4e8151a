//! Engine scenarios

pub mod scheduler;
pub mod steps;
