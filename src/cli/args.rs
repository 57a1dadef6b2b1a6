//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Options shared by every command that builds a job request
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Video profile key
    #[arg(long, default_value = "default")]
    pub video: String,

    /// Audio profile key
    #[arg(long, default_value = "default")]
    pub audio: String,

    /// Output resolution, WxH
    #[arg(long, default_value = "")]
    pub resize: String,

    /// Crop in pixels, L,T,R,B
    #[arg(long, default_value = "")]
    pub crop: String,

    /// Video post-processing: none, edge, deband or both
    #[arg(long, default_value = "edge")]
    pub vpp: String,

    /// Audio languages to keep, comma separated (e.g. eng,jpn)
    #[arg(long)]
    pub lang: Vec<String>,

    /// Language of the audio track flagged default
    #[arg(long)]
    pub default_lang: Option<String>,

    /// Title metadata; an empty value strips the title
    #[arg(long)]
    pub title: Option<String>,

    /// Profile parameter, key=value or a bare flag (repeatable)
    #[arg(long = "set", value_name = "KEY[=VALUE]")]
    pub set: Vec<String>,

    /// Directory for intermediates and the final mkv
    #[arg(long)]
    pub out_path: Option<String>,

    /// Configuration file (default: batch-encoder.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the encode command
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// File or directory to encode
    #[arg(long)]
    pub path: String,

    /// Prefix of the generated job scripts
    #[arg(long)]
    pub prefix: String,

    /// Descend into subdirectories
    #[arg(long)]
    pub recursive: bool,

    /// Directory for the generated job scripts
    #[arg(long)]
    pub job_path: Option<String>,

    /// Print the scripts instead of writing them
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub request: RequestArgs,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Saved ffprobe JSON output
    #[arg(long)]
    pub file: PathBuf,

    /// Source path the plan refers to (default: the probe file with an mkv extension)
    #[arg(long)]
    pub source: Option<String>,

    /// Output the plan as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub request: RequestArgs,
}

/// Arguments for the profiles command
#[derive(Args, Debug)]
pub struct ProfilesArgs {
    /// Configuration file (default: batch-encoder.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
