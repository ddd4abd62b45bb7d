//! Shared utilities

pub mod math;
