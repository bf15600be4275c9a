//! Command-line interface using Clap v4.

use crate::config::EngineConfig;
use crate::engine::{Engine, TaskSpec};
use crate::eval::{EvalRunner, Protocol};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Conclave - multi-agent deliberation over language model backends
#[derive(Parser, Debug)]
#[command(name = "conclave")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer one question through the author/reviewer/meta-reviewer cycle
    Review {
        /// The question to deliberate
        question: String,

        /// Number of concurrent reviewers
        #[arg(short = 'n', long, default_value = "3")]
        reviewers: usize,

        /// Task family the question belongs to
        #[arg(short, long, default_value = "gsm")]
        task: Task,
    },

    /// Answer one question, then have the same agent critique its answer
    Reflect {
        question: String,

        #[arg(short, long, default_value = "gsm")]
        task: Task,
    },

    /// Answer one question through a multi-agent debate
    Debate {
        question: String,

        /// Number of debating agents
        #[arg(short = 'n', long, default_value = "3")]
        agents: usize,

        /// Number of debate rounds
        #[arg(short, long, default_value = "2")]
        rounds: usize,

        #[arg(short, long, default_value = "gsm")]
        task: Task,
    },

    /// Evaluate a protocol over a JSONL dataset
    Eval {
        /// Path to the dataset (one JSON question per line)
        dataset: PathBuf,

        /// Protocol to evaluate
        #[arg(short, long, default_value = "review")]
        protocol: ProtocolArg,

        /// Evaluate only the first N questions
        #[arg(short, long)]
        limit: Option<usize>,

        #[arg(short = 'n', long, default_value = "3")]
        reviewers: usize,

        #[arg(long, default_value = "3")]
        agents: usize,

        #[arg(long, default_value = "2")]
        rounds: usize,

        #[arg(short, long, default_value = "gsm")]
        task: Task,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Task {
    /// Math word problems with numeric answers
    Gsm,
    /// Multiple-choice questions answered A-D
    Mmlu,
}

impl Task {
    fn spec(self) -> TaskSpec {
        match self {
            Self::Gsm => TaskSpec::gsm(),
            Self::Mmlu => TaskSpec::mmlu(),
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ProtocolArg {
    Review,
    Reflect,
    Debate,
}

/// Main CLI entry point
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_path(path)?,
        None => EngineConfig::load()?,
    };
    init_tracing(&config);

    match cli.command {
        Commands::Review {
            question,
            reviewers,
            task,
        } => {
            let engine = Engine::new(config, task.spec());
            let record = engine.run_review_cycle(&question, reviewers).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Reflect { question, task } => {
            let engine = Engine::new(config, task.spec());
            let record = engine.run_self_reflection(&question).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Debate {
            question,
            agents,
            rounds,
            task,
        } => {
            let engine = Engine::new(config, task.spec());
            let record = engine.run_debate(&question, agents, rounds).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Eval {
            dataset,
            protocol,
            limit,
            reviewers,
            agents,
            rounds,
            task,
        } => {
            let protocol = match protocol {
                ProtocolArg::Review => Protocol::Review {
                    n_reviewers: reviewers,
                },
                ProtocolArg::Reflect => Protocol::Reflection,
                ProtocolArg::Debate => Protocol::Debate {
                    n_agents: agents,
                    n_rounds: rounds,
                },
            };
            let engine = Engine::new(config, task.spec());
            let summary = EvalRunner::new(engine, protocol)
                .with_limit(limit)
                .run(&dataset)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn init_tracing(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_eval_defaults() {
        let cli = Cli::parse_from(["conclave", "eval", "data/gsm.jsonl"]);
        match cli.command {
            Commands::Eval {
                reviewers, limit, ..
            } => {
                assert_eq!(reviewers, 3);
                assert!(limit.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
