//! Batch Encoder
//!
//! Probes video files and writes the PowerShell job scripts that encode,
//! mux and clean up an archival transcode batch.
//!
//! # Usage
//!
//! ```bash
//! batch-encoder encode --path "S:/Shows/Season 1" --prefix S01 --audio opus-pans --lang eng
//! batch-encoder plan --file probe.json --json
//! batch-encoder profiles
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use batch_encoder::cli::{commands, Cli, Commands};
use batch_encoder::utils::logging::{init_logging, LogLevel, LoggingConfig};

/// Main entry point for the batch encoder
fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let level = cli
        .log_level
        .parse::<LogLevel>()
        .map_err(anyhow::Error::msg)?;
    init_logging(&LoggingConfig {
        level,
        json: cli.log_json,
    });

    // Execute the requested command
    match cli.command {
        Commands::Encode(args) => {
            info!("Executing encode command");
            commands::encode(args)?;
        }
        Commands::Plan(args) => {
            info!("Executing plan command");
            commands::plan(args)?;
        }
        Commands::Profiles(args) => {
            commands::profiles(args)?;
        }
    }

    Ok(())
}
