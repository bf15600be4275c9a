//! Conclave - multi-agent deliberation over language model backends.
//!
//! Agents backed by OpenAI-compatible endpoints answer questions through
//! structured protocols: a review cycle (author, reviewers, meta-reviewer,
//! rebuttal), self-reflection, and multi-round debate. Final answers are
//! extracted from free-form model output and aggregated by majority, and
//! an evaluation harness grades whole datasets against ground truth.
//!
//! ## Quick Start
//!
//! ```bash
//! # One question through the review cycle
//! conclave review "What is 2 + 3 * 4?"
//!
//! # Three agents debating for two rounds
//! conclave debate -n 3 -r 2 "What is 2 + 3 * 4?"
//!
//! # Grade a dataset
//! conclave eval data/gsm.jsonl --protocol review --limit 50
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod eval;
pub mod provider;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
