//! User price alerts

pub mod evaluator;

pub use evaluator::{AlertEvaluator, AlertRun};
