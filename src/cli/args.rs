//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for bidichat
#[derive(Parser, Debug)]
#[command(
    name = "bidichat",
    version,
    about = "Streaming chat client for mixed Arabic/Persian/English Markdown"
)]
pub struct Cli {
    /// Configuration file path; defaults to bidichat.toml lookup in the workspace
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Query endpoint, overriding `[stream] endpoint`
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// UI locale, overriding `[render] locale` (e.g. fa, ar-EG, en)
    #[arg(long, global = true)]
    pub locale: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat; every line is sent as a query
    Chat {
        /// Print the rendered HTML of each completed reply
        #[arg(long)]
        html: bool,
    },

    /// Single query; streams the reply to stdout
    Ask {
        /// The query to send
        prompt: Vec<String>,

        /// Print the rendered HTML instead of the raw reply
        #[arg(long)]
        html: bool,
    },

    /// Render Markdown from a file or stdin to sanitized HTML
    Render {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// Print the normalized text view of a file or stdin
    Normalize {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// Write a default bidichat.toml into the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
