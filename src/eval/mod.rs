//! Benchmark evaluation over JSONL datasets.

pub mod dataset;
pub mod runner;

pub use dataset::{Question, ground_truth, load_questions};
pub use runner::{EvalRunner, EvalSummary, Protocol};
