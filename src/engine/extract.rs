//! Decision and answer extraction from free-form model output.
//!
//! Extraction is total and lenient: malformed or sentinel text yields
//! `None` (an abstention), never an error. Labeled lines win over
//! positional fallbacks so models that follow the prompt format are
//! always read correctly.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Verdict a reviewer or meta-reviewer renders on a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    Right,
    Wrong,
    Factual,
    NonFactual,
}

/// An extracted final answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Answer {
    Number(f64),
    Choice(char),
}

/// Which answer family a task expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Numeric,
    Letter,
}

/// A task family: its name (used in prompts and record paths) and the
/// answer format its questions expect.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: String,
    pub answer: AnswerKind,
}

impl TaskSpec {
    /// Grade-school math word problems with numeric answers.
    pub fn gsm() -> Self {
        Self {
            name: "gsm8k".to_string(),
            answer: AnswerKind::Numeric,
        }
    }

    /// Multiple-choice questions answered with a letter A-D.
    pub fn mmlu() -> Self {
        Self {
            name: "mmlu".to_string(),
            answer: AnswerKind::Letter,
        }
    }
}

static DECISION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)decision\s*:\s*\**\s*([A-Za-z]+(?:-[A-Za-z]+)?)").expect("valid regex")
});

static ANSWER_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^.*answer\s*:\s*(.+)$").expect("valid regex"));

// One alternation so a fraction is consumed whole and never read as two
// separate numbers. Commas as thousands separators, optional percent.
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(-?\d+(?:\.\d+)?)\s*/\s*(-?\d+(?:\.\d+)?)|(-?\d+(?:,\d{3})*(?:\.\d+)?)(%)?")
        .expect("valid regex")
});

static LETTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([A-D])\)|\b([A-D])\b").expect("valid regex"));

/// First `Decision:` verdict in the text, case-insensitively, tolerating
/// markdown emphasis around the word. Unrecognized verdicts are `None`.
pub fn extract_decision(text: &str) -> Option<Decision> {
    let captures = DECISION_RE.captures(text)?;
    match captures[1].to_ascii_lowercase().as_str() {
        "right" | "correct" => Some(Decision::Right),
        "wrong" | "incorrect" => Some(Decision::Wrong),
        "factual" => Some(Decision::Factual),
        "non-factual" | "nonfactual" => Some(Decision::NonFactual),
        _ => None,
    }
}

/// Final answer of the given kind from the text, preferring the last
/// labeled `Answer:` line, then falling back to scanning the whole text.
pub fn extract_answer(text: &str, kind: AnswerKind) -> Option<Answer> {
    if let Some(captures) = ANSWER_LINE_RE.captures_iter(text).last() {
        let line = &captures[1];
        let from_line = match kind {
            AnswerKind::Numeric => last_number(line),
            AnswerKind::Letter => first_letter(line),
        };
        if from_line.is_some() {
            return from_line;
        }
    }

    match kind {
        AnswerKind::Numeric => last_number(text),
        AnswerKind::Letter => last_letter(text),
    }
}

/// Whether two extracted answers agree. Numbers use an absolute 0.01
/// tolerance; letters compare exactly.
pub fn answers_match(a: &Answer, b: &Answer) -> bool {
    match (a, b) {
        (Answer::Number(x), Answer::Number(y)) => (x - y).abs() <= 0.01,
        (Answer::Choice(x), Answer::Choice(y)) => x == y,
        _ => false,
    }
}

fn last_number(text: &str) -> Option<Answer> {
    let captures = NUMBER_RE.captures_iter(text).last()?;
    if let (Some(num), Some(den)) = (captures.get(1), captures.get(2)) {
        let den: f64 = den.as_str().parse().ok()?;
        if den == 0.0 {
            return None;
        }
        let num: f64 = num.as_str().parse().ok()?;
        return Some(Answer::Number(num / den));
    }

    let raw = captures.get(3)?.as_str().replace(',', "");
    let mut value: f64 = raw.parse().ok()?;
    if captures.get(4).is_some() {
        value /= 100.0;
    }
    Some(Answer::Number(value))
}

fn first_letter(text: &str) -> Option<Answer> {
    let captures = LETTER_RE.captures(text)?;
    letter_from(&captures)
}

fn last_letter(text: &str) -> Option<Answer> {
    let captures = LETTER_RE.captures_iter(text).last()?;
    letter_from(&captures)
}

fn letter_from(captures: &regex::Captures<'_>) -> Option<Answer> {
    let m = captures.get(1).or_else(|| captures.get(2))?;
    m.as_str().chars().next().map(Answer::Choice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("Decision: right", Some(Decision::Right))]
    #[case("Decision: Wrong", Some(Decision::Wrong))]
    #[case("decision:  **wrong**", Some(Decision::Wrong))]
    #[case("My Decision: non-factual today", Some(Decision::NonFactual))]
    #[case("Decision: nonfactual", Some(Decision::NonFactual))]
    #[case("Decision: factual", Some(Decision::Factual))]
    #[case("Decision: maybe", None)]
    #[case("no verdict here", None)]
    fn test_extract_decision(#[case] text: &str, #[case] expected: Option<Decision>) {
        assert_eq!(extract_decision(text), expected);
    }

    #[test]
    fn test_first_decision_wins() {
        let text = "Decision: wrong\nOn reflection... Decision: right";
        assert_eq!(extract_decision(text), Some(Decision::Wrong));
    }

    #[rstest]
    #[case("Thoughts: 6*7.\nAnswer: 42", 42.0)]
    #[case("Answer: 42.0", 42.0)]
    #[case("Answer: 50%", 0.5)]
    #[case("Answer: 3/4", 0.75)]
    #[case("Answer: 1,250 dollars", 1250.0)]
    #[case("Answer: -12.5", -12.5)]
    #[case("I think 10, no wait. Answer: 20", 20.0)]
    fn test_labeled_numeric_answer(#[case] text: &str, #[case] expected: f64) {
        assert_eq!(
            extract_answer(text, AnswerKind::Numeric),
            Some(Answer::Number(expected))
        );
    }

    #[rstest]
    #[case("she has 3 apples and eats 1, so 2 remain", 2.0)]
    #[case("the total is 120.", 120.0)]
    #[case("roughly 80% of them", 0.8)]
    fn test_numeric_fallback_takes_last_number(#[case] text: &str, #[case] expected: f64) {
        assert_eq!(
            extract_answer(text, AnswerKind::Numeric),
            Some(Answer::Number(expected))
        );
    }

    #[test]
    fn test_zero_denominator_is_abstention() {
        assert_eq!(extract_answer("Answer: 5/0", AnswerKind::Numeric), None);
    }

    #[test]
    fn test_no_number_is_abstention() {
        assert_eq!(extract_answer("I cannot solve this.", AnswerKind::Numeric), None);
        assert_eq!(
            extract_answer("[Model error] connection refused", AnswerKind::Numeric),
            None
        );
    }

    #[rstest]
    #[case("Answer: B", 'B')]
    #[case("Answer: (C) because of gravity", 'C')]
    #[case("the right choice is (D)", 'D')]
    #[case("A is tempting but B fits better", 'B')]
    fn test_letter_answers(#[case] text: &str, #[case] expected: char) {
        assert_eq!(
            extract_answer(text, AnswerKind::Letter),
            Some(Answer::Choice(expected))
        );
    }

    #[test]
    fn test_letter_not_found() {
        assert_eq!(extract_answer("answer: maybe the third one", AnswerKind::Letter), None);
    }

    #[test]
    fn test_extraction_is_idempotent_on_its_own_rendering() {
        // extracting from "Answer: 42" then re-extracting from "42" agrees
        let first = extract_answer("Answer: 42", AnswerKind::Numeric).unwrap();
        let second = extract_answer("42", AnswerKind::Numeric).unwrap();
        assert!(answers_match(&first, &second));
    }

    #[test]
    fn test_answers_match_tolerance() {
        assert!(answers_match(&Answer::Number(2.0), &Answer::Number(2.005)));
        assert!(!answers_match(&Answer::Number(2.0), &Answer::Number(2.02)));
        assert!(!answers_match(&Answer::Number(2.0), &Answer::Choice('B')));
    }

    proptest! {
        #[test]
        fn test_extraction_never_panics(text in "\\PC*") {
            let _ = extract_decision(&text);
            let _ = extract_answer(&text, AnswerKind::Numeric);
            let _ = extract_answer(&text, AnswerKind::Letter);
        }
    }
}
