//! Configuration types. Every field has a serde default so a partial
//! TOML file (or none at all) yields a usable configuration.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

// ============================================================================
// Defaults
// ============================================================================

fn default_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_reviewers() -> Vec<String> {
    vec![default_model()]
}

fn default_max_tokens() -> Option<u32> {
    Some(1024)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_records_dir() -> String {
    "records".to_string()
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Full chat-completions endpoint URL.
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

/// Which model backs each deliberation role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelRoster {
    pub author: String,
    /// Pool the reviewer selection strategy draws from.
    pub reviewers: Vec<String>,
    pub meta: String,
}

impl Default for ModelRoster {
    fn default() -> Self {
        Self {
            author: default_model(),
            reviewers: default_reviewers(),
            meta: default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub temperature: Option<f32>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<u32>,
    /// Wall-clock budget for a single backend call, in seconds.
    pub call_budget_secs: Option<u64>,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            temperature: None,
            max_tokens: default_max_tokens(),
            call_budget_secs: None,
        }
    }
}

/// How reviewer slots map onto the reviewer model pool. Pure with respect
/// to its inputs so a seeded run is reproducible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ReviewerSelection {
    /// Slot i gets pool\[i mod len\].
    #[default]
    ByIndex,
    /// Slot i gets a pool member drawn from a seed-derived generator.
    Seeded { seed: u64 },
}

impl ReviewerSelection {
    pub fn select<'a>(&self, pool: &'a [String], index: usize) -> Option<&'a str> {
        if pool.is_empty() {
            return None;
        }
        let i = match self {
            Self::ByIndex => index % pool.len(),
            Self::Seeded { seed } => {
                let mut rng = StdRng::seed_from_u64(seed ^ index as u64);
                rng.random_range(0..pool.len())
            }
        };
        Some(pool[i].as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory evaluation record files are written under.
    pub records_dir: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            records_dir: default_records_dir(),
        }
    }
}

// ============================================================================
// Root
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub provider: ProviderSettings,
    pub models: ModelRoster,
    pub limits: LimitSettings,
    pub selection: ReviewerSelection,
    pub logging: LoggingSettings,
    pub output: OutputSettings,
}
