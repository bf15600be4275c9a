//! Serializable outcomes of a deliberation run.

use crate::engine::message::Message;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Outcome of one review cycle: the author's response, each reviewer's
/// critique, the meta-review, and a rebuttal exactly when the
/// meta-review judged the response wrong.
#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub author_response: String,
    pub reviews: Vec<String>,
    pub meta_review: String,
    pub author_rebuttal: Option<String>,
    pub total_tokens: u64,
}

impl ReviewRecord {
    /// The author's standing answer: the rebuttal when one was produced,
    /// the initial response otherwise.
    pub fn final_response(&self) -> &str {
        self.author_rebuttal
            .as_deref()
            .unwrap_or(&self.author_response)
    }
}

// Reviews flatten to review1..reviewN so records stay greppable flat maps
// rather than nested arrays.
impl Serialize for ReviewRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = 3 + self.reviews.len() + usize::from(self.author_rebuttal.is_some());
        let mut map = serializer.serialize_map(Some(fields))?;
        map.serialize_entry("author_response", &self.author_response)?;
        for (i, review) in self.reviews.iter().enumerate() {
            map.serialize_entry(&format!("review{}", i + 1), review)?;
        }
        map.serialize_entry("meta_review", &self.meta_review)?;
        if let Some(ref rebuttal) = self.author_rebuttal {
            map.serialize_entry("author_rebuttal", rebuttal)?;
        }
        map.serialize_entry("total_tokens", &self.total_tokens)?;
        map.end()
    }
}

/// Outcome of a self-reflection run: the initial response and the
/// second-pass reflection from the same agent.
#[derive(Debug, Clone, Serialize)]
pub struct ReflectionRecord {
    pub response: String,
    pub reflection: String,
    pub total_tokens: u64,
}

/// Outcome of a debate: every agent's full conversation history.
#[derive(Debug, Clone, Serialize)]
pub struct DebateRecord {
    #[serde(rename = "debate_history")]
    pub agent_histories: Vec<Vec<Message>>,
    pub total_tokens: u64,
}

/// Any protocol outcome, for uniform record writing.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DeliberationRecord {
    Review(ReviewRecord),
    Reflection(ReflectionRecord),
    Debate(DebateRecord),
}

impl DeliberationRecord {
    pub fn total_tokens(&self) -> u64 {
        match self {
            Self::Review(r) => r.total_tokens,
            Self::Reflection(r) => r.total_tokens,
            Self::Debate(r) => r.total_tokens,
        }
    }
}

/// A record graded against ground truth, as written to evaluation output.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord {
    pub id: u64,
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_score: Option<u8>,
    #[serde(flatten)]
    pub record: DeliberationRecord,
}
