//! Majority aggregation over extracted answers and decisions.
//!
//! `None` votes are abstentions: they never form a bucket and never block
//! a majority. Ties break toward the value whose first vote came earliest.

use crate::engine::extract::{self, Answer, AnswerKind, Decision};
use crate::engine::record::{DebateRecord, ReviewRecord};

/// Majority over votes using a caller-supplied equivalence. Abstentions
/// (`None`) are skipped; all-abstain yields `None`.
fn majority_by<T, F>(votes: &[Option<T>], same: F) -> Option<&T>
where
    F: Fn(&T, &T) -> bool,
{
    // (first representative, count), in first-occurrence order
    let mut buckets: Vec<(&T, usize)> = Vec::new();
    for vote in votes.iter().flatten() {
        match buckets.iter_mut().find(|(rep, _)| same(rep, vote)) {
            Some((_, count)) => *count += 1,
            None => buckets.push((vote, 1)),
        }
    }

    let mut winner: Option<(&T, usize)> = None;
    for (rep, count) in buckets {
        // strictly greater keeps the earliest bucket on ties
        if winner.is_none_or(|(_, best)| count > best) {
            winner = Some((rep, count));
        }
    }
    winner.map(|(rep, _)| rep)
}

/// Majority answer, bucketing numeric votes by the extraction tolerance.
pub fn majority(votes: &[Option<Answer>]) -> Option<Answer> {
    majority_by(votes, extract::answers_match).copied()
}

/// Majority verdict over extracted decisions.
pub fn majority_decision(votes: &[Option<Decision>]) -> Option<Decision> {
    majority_by(votes, |a, b| a == b).copied()
}

/// Consensus answer of a review cycle. The pool is the author's standing
/// response plus every review and the meta-review; if every member
/// abstains, fall back to the standing response alone.
pub fn review_cycle_answer(record: &ReviewRecord, kind: AnswerKind) -> Option<Answer> {
    let mut votes = Vec::with_capacity(record.reviews.len() + 2);
    votes.push(extract::extract_answer(record.final_response(), kind));
    for review in &record.reviews {
        votes.push(extract::extract_answer(review, kind));
    }
    votes.push(extract::extract_answer(&record.meta_review, kind));

    majority(&votes).or_else(|| extract::extract_answer(record.final_response(), kind))
}

/// Consensus answer of a debate: majority over each agent's final message.
pub fn debate_answer(record: &DebateRecord, kind: AnswerKind) -> Option<Answer> {
    let votes: Vec<Option<Answer>> = record
        .agent_histories
        .iter()
        .map(|history| {
            history
                .last()
                .and_then(|m| extract::extract_answer(&m.content, kind))
        })
        .collect();
    majority(&votes)
}
