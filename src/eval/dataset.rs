//! Dataset loading: one JSON question per line.

use crate::engine::extract::{self, Answer, AnswerKind};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One benchmark question with its reference answer text.
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub question: String,
    pub answer: String,
}

/// Load a JSONL dataset, skipping blank lines.
pub fn load_questions(path: impl AsRef<Path>) -> Result<Vec<Question>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset: {}", path.display()))?;

    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("bad record on line {} of {}", i + 1, path.display()))
        })
        .collect()
}

/// Parse a reference answer. Math datasets often append the final value
/// after a `####` marker; when present only that tail is read.
pub fn ground_truth(answer: &str, kind: AnswerKind) -> Option<Answer> {
    let tail = answer
        .rsplit_once("####")
        .map(|(_, tail)| tail)
        .unwrap_or(answer);
    extract::extract_answer(tail.trim(), kind)
}
