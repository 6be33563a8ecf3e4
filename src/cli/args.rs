//! Command-line argument parsing for silabo-rag
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogLevel;

/// silabo-rag - Ask questions about course syllabi with a local Ollama model
#[derive(Parser, Debug)]
#[command(name = "silabo-rag")]
#[command(version)]
#[command(about = "Ask questions about course syllabi with a local Ollama model", long_about = None)]
pub struct Args {
    /// Configuration file path (default: ~/.silabo-rag/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Ollama model used for answers (overrides config)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Ollama base URL (overrides config)
    #[arg(long, global = true)]
    pub ollama_url: Option<String>,

    /// Verbosity level: -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only in logs, no retrieved chunks)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand (interactive chat when omitted)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Load, chunk and index the syllabus directory
    Ingest {
        /// Directory with syllabus PDFs (overrides config)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Drop the existing collection first
        #[arg(long)]
        reset: bool,
    },

    /// Show the passages retrieved for a query, without generating an answer
    Search {
        /// Query text
        query: String,

        /// Number of passages to return (overrides config)
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Answer a single question
    Ask {
        /// Question text
        question: String,

        /// Print the retrieved chunks before the answer
        #[arg(long)]
        show_chunks: bool,
    },

    /// Interactive question loop
    Chat,

    /// Display current configuration
    Config,

    /// Check Ollama, models and the index
    Doctor,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Subcommand to run, chat by default
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat)
    }
}

impl Verbosity {
    /// Log level forced by the flags; `None` keeps the configured level
    pub fn log_level(&self) -> Option<LogLevel> {
        match self {
            Verbosity::Quiet => Some(LogLevel::Error),
            Verbosity::Normal => None,
            Verbosity::Verbose => Some(LogLevel::Debug),
            Verbosity::VeryVerbose => Some(LogLevel::Trace),
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
