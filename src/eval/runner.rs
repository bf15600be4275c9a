//! Benchmark runner: deliberate over a dataset, grade against ground
//! truth, and persist per-question records as JSONL.

use crate::engine::consensus;
use crate::engine::extract::{self, Answer};
use crate::engine::record::{DeliberationRecord, ScoredRecord};
use crate::engine::Engine;
use crate::eval::dataset::{self, Question};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Which deliberation protocol the run exercises.
#[derive(Debug, Clone, Copy)]
pub enum Protocol {
    Review { n_reviewers: usize },
    Reflection,
    Debate { n_agents: usize, n_rounds: usize },
}

/// Aggregate outcome of one evaluation run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EvalSummary {
    pub n_questions: usize,
    /// Questions the first response already answered correctly.
    pub single_correct: usize,
    /// Questions the full deliberation answered correctly.
    pub multi_correct: usize,
    /// Ids any stage got wrong.
    pub hard: Vec<u64>,
    /// Ids initially wrong but fixed by deliberation.
    pub rectified: Vec<u64>,
    pub mean_tokens: f64,
    pub mean_seconds: f64,
    pub records_path: Option<PathBuf>,
}

pub struct EvalRunner {
    engine: Engine,
    protocol: Protocol,
    limit: Option<usize>,
}

impl EvalRunner {
    pub fn new(engine: Engine, protocol: Protocol) -> Self {
        Self {
            engine,
            protocol,
            limit: None,
        }
    }

    /// Evaluate only the first `limit` questions.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Run the protocol over every question in the dataset. Backend
    /// failures surface as sentinel answers and score zero; the run
    /// never halts on them.
    pub async fn run(&self, dataset_path: impl AsRef<Path>) -> Result<EvalSummary> {
        let mut questions = dataset::load_questions(dataset_path)?;
        if let Some(limit) = self.limit {
            questions.truncate(limit);
        }
        anyhow::ensure!(!questions.is_empty(), "dataset has no questions");

        let kind = self.engine.task().answer;
        let mut scored = Vec::with_capacity(questions.len());
        let mut summary = EvalSummary {
            n_questions: questions.len(),
            single_correct: 0,
            multi_correct: 0,
            hard: Vec::new(),
            rectified: Vec::new(),
            mean_tokens: 0.0,
            mean_seconds: 0.0,
            records_path: None,
        };

        let started = Instant::now();
        let mut total_tokens = 0u64;
        for (id, question) in questions.iter().enumerate() {
            let id = id as u64;
            let truth = dataset::ground_truth(&question.answer, kind);
            let record = self.deliberate(question).await?;
            total_tokens += record.total_tokens();

            let (single, multi) = self.grade(&record, truth.as_ref());
            let correct = multi.unwrap_or(single.unwrap_or(false));
            tracing::info!(id, single = ?single, multi = ?multi, "question graded");

            if single == Some(true) {
                summary.single_correct += 1;
            }
            if correct {
                summary.multi_correct += 1;
            }
            if !correct || single == Some(false) {
                summary.hard.push(id);
            }
            if single == Some(false) && correct {
                summary.rectified.push(id);
            }

            scored.push(ScoredRecord {
                id,
                score: u8::from(correct),
                single_score: single.map(u8::from),
                multi_score: multi.map(u8::from),
                record,
            });
        }

        summary.mean_tokens = total_tokens as f64 / questions.len() as f64;
        summary.mean_seconds = started.elapsed().as_secs_f64() / questions.len() as f64;
        summary.records_path = Some(self.write_records(&scored)?);
        Ok(summary)
    }

    async fn deliberate(&self, question: &Question) -> Result<DeliberationRecord> {
        let record = match self.protocol {
            Protocol::Review { n_reviewers } => DeliberationRecord::Review(
                self.engine
                    .run_review_cycle(&question.question, n_reviewers)
                    .await?,
            ),
            Protocol::Reflection => DeliberationRecord::Reflection(
                self.engine.run_self_reflection(&question.question).await?,
            ),
            Protocol::Debate { n_agents, n_rounds } => DeliberationRecord::Debate(
                self.engine
                    .run_debate(&question.question, n_agents, n_rounds)
                    .await?,
            ),
        };
        Ok(record)
    }

    /// Grade one record: the first-response score and the
    /// post-deliberation score, where the protocol defines both.
    fn grade(
        &self,
        record: &DeliberationRecord,
        truth: Option<&Answer>,
    ) -> (Option<bool>, Option<bool>) {
        let kind = self.engine.task().answer;
        let matches = |answer: Option<Answer>| match (answer, truth) {
            (Some(a), Some(t)) => extract::answers_match(&a, t),
            _ => false,
        };

        match record {
            DeliberationRecord::Review(review) => {
                let single = matches(extract::extract_answer(&review.author_response, kind));
                let multi = matches(consensus::review_cycle_answer(review, kind));
                (Some(single), Some(multi))
            }
            DeliberationRecord::Reflection(reflection) => {
                let single = matches(extract::extract_answer(&reflection.response, kind));
                let multi = matches(extract::extract_answer(&reflection.reflection, kind));
                (Some(single), Some(multi))
            }
            DeliberationRecord::Debate(debate) => {
                let multi = matches(consensus::debate_answer(debate, kind));
                (None, Some(multi))
            }
        }
    }

    /// Write records under `records_dir/<task>/<date>-<run id>.jsonl`.
    fn write_records(&self, scored: &[ScoredRecord]) -> Result<PathBuf> {
        let dir = PathBuf::from(&self.engine.config().output.records_dir)
            .join(&self.engine.task().name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create records dir: {}", dir.display()))?;

        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let date = chrono::Local::now().format("%Y-%m-%d");
        let path = dir.join(format!("{date}-{}.jsonl", &run_id[..8]));

        let mut lines = String::new();
        for record in scored {
            lines.push_str(&serde_json::to_string(record)?);
            lines.push('\n');
        }
        fs::write(&path, lines)
            .with_context(|| format!("failed to write records: {}", path.display()))?;
        tracing::info!(path = %path.display(), records = scored.len(), "records written");
        Ok(path)
    }
}
