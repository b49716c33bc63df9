use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command line arguments for the ASTRA CLI
#[derive(Parser, Debug)]
#[clap(
    name = "astra",
    about = "ASTRA terminal: progression, AI tasks and Gemini model diagnostics"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file, defaults to ~/.astra/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the models the API key can see
    Models,
    /// Check which candidate models answer a test prompt
    Probe,
    /// Connectivity test across candidate models with a recommendation
    Connectivity,
    /// Show XP, level and skills
    Progress {
        /// Clear all progression state
        #[arg(long)]
        reset: bool,
    },
    /// Play a five-question trivia round
    Trivia {
        /// Question topic
        #[arg(default_value = astra::tasks::trivia::DEFAULT_TOPIC)]
        topic: String,
    },
    /// Analyze an image or PDF
    Scan {
        /// File to scan
        file: PathBuf,
    },
    /// Get a career suggestion and talk it through
    Career {
        /// Academic subjects, e.g. "Physics, Coding, Math"
        #[arg(long)]
        subjects: String,
        /// Interests, e.g. "Robotics, Sci-Fi, Logic Puzzles"
        #[arg(long)]
        interests: String,
    },
}
