// TOML config adapter - Configuration management using TOML files

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EncodeError, EncodeResult};
use crate::profiles::{OptionArgs, ProfileTable, ProfileTemplate};

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "batch-encoder.toml";

pub const ENV_WORK_DIR: &str = "BATCH_ENCODER_WORK_DIR";
pub const ENV_JOB_DIR: &str = "BATCH_ENCODER_JOB_DIR";
pub const ENV_FFPROBE: &str = "BATCH_ENCODER_FFPROBE";

/// Executables the rendered scripts invoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub video_encoder: String,
    pub audio_encoder: String,
    pub muxer: String,
    pub premuxer: String,
    pub prober: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            video_encoder: "NVEncC64.exe".to_string(),
            audio_encoder: "ffmpeg.exe".to_string(),
            muxer: "ffmpeg.exe".to_string(),
            premuxer: "mkvmerge.exe".to_string(),
            prober: "ffprobe".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Intermediates and final muxed files
    pub work_dir: String,
    /// Rendered job scripts
    pub job_dir: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            work_dir: "R:/temp-stuff/_encodes/".to_string(),
            job_dir: "./output/".to_string(),
        }
    }
}

/// An audio profile from the config file: a bare option string, or a table
/// that also names the output extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AudioProfileEntry {
    Options(String),
    Detailed {
        options: String,
        #[serde(default)]
        extension: Option<String>,
    },
}

/// User-defined fixed profiles, merged over the bundled ones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOverrides {
    pub video: BTreeMap<String, String>,
    pub audio: BTreeMap<String, AudioProfileEntry>,
}

/// Resolved application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tools: ToolPaths,
    pub paths: PathSettings,
    pub profiles: ProfileOverrides,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> EncodeResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `explicit`, else from [`DEFAULT_CONFIG_FILE`] when present,
    /// else defaults; environment overrides are applied on top.
    pub fn load(explicit: Option<&Path>) -> EncodeResult<Self> {
        let mut config = match Self::config_path(explicit)? {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let content = std::fs::read_to_string(&path)?;
                Self::from_toml_str(&content)?
            }
            None => {
                debug!("No configuration file; using defaults");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn config_path(explicit: Option<&Path>) -> EncodeResult<Option<PathBuf>> {
        match explicit {
            Some(path) if path.is_file() => Ok(Some(path.to_path_buf())),
            Some(path) => Err(EncodeError::Config {
                message: format!("config file does not exist: {}", path.display()),
            }),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                Ok(fallback.is_file().then_some(fallback))
            }
        }
    }

    /// Apply `BATCH_ENCODER_*` overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty(ENV_WORK_DIR) {
            debug!("{} overrides work_dir", ENV_WORK_DIR);
            self.paths.work_dir = dir;
        }
        if let Some(dir) = non_empty(ENV_JOB_DIR) {
            debug!("{} overrides job_dir", ENV_JOB_DIR);
            self.paths.job_dir = dir;
        }
        if let Some(prober) = non_empty(ENV_FFPROBE) {
            debug!("{} overrides prober", ENV_FFPROBE);
            self.tools.prober = prober;
        }
    }

    /// Bundled profiles with the configured ones merged over them
    pub fn profile_table(&self) -> EncodeResult<ProfileTable> {
        let mut table = ProfileTable::builtin();

        for (key, options) in &self.profiles.video {
            table.insert_video(key, ProfileTemplate::Fixed(OptionArgs::parse(options)?));
        }
        for (key, entry) in &self.profiles.audio {
            let (options, extension) = match entry {
                AudioProfileEntry::Options(options) => (options, None),
                AudioProfileEntry::Detailed { options, extension } => (options, extension.as_deref()),
            };
            table.insert_audio(
                key,
                ProfileTemplate::Fixed(OptionArgs::parse(options)?),
                extension.unwrap_or("mka"),
            );
        }

        Ok(table)
    }
}
