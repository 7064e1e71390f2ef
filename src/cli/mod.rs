//! CLI module for Oppsum.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Oppsum - Resilient Video Summarization
///
/// Turns a YouTube URL or video ID into a natural-language summary, falling
/// back gracefully when captions or metadata are unavailable. The name
/// comes from the Norwegian "oppsummere," meaning "to summarize."
#[derive(Parser, Debug)]
#[command(name = "oppsum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a video from its URL or ID
    Summarize {
        /// YouTube URL or 11-character video ID
        input: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Estimated-token budget per transcript chunk
        #[arg(long)]
        budget: Option<usize>,
    },

    /// Extract a video's transcript and present it readably
    Transcribe {
        /// YouTube URL or 11-character video ID
        input: String,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init,

    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
