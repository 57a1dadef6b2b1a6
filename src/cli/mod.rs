//! CLI module for the batch encoder
//!
//! This module handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::{EncodeArgs, PlanArgs, ProfilesArgs, RequestArgs};

/// Batch Encoder
///
/// Probes video files and writes PowerShell job scripts that encode video,
/// encode or copy audio, extract subtitles, mux and clean up.
#[derive(Parser, Debug)]
#[command(name = "batch-encoder")]
#[command(about = "Batch Encoder - archival transcoding job plans from ffprobe metadata")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan a batch and write the job scripts
    Encode(args::EncodeArgs),
    /// Compile the plan for one saved probe output
    Plan(args::PlanArgs),
    /// List video and audio profiles
    Profiles(args::ProfilesArgs),
}
