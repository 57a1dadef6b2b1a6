//! FFprobe adapter for media file probing
//!
//! Runs ffprobe once per file, asking for streams, chapters and the side
//! data of the first frame, and hands the JSON text back untouched.

use std::process::Command;

use tracing::debug;

use crate::error::{EncodeError, EncodeResult};
use crate::ports::ProbePort;

/// FFprobe-based probe adapter
#[derive(Debug, Clone)]
pub struct FfprobeAdapter {
    ffprobe_path: String,
}

impl FfprobeAdapter {
    pub fn new(ffprobe_path: &str) -> Self {
        Self {
            ffprobe_path: ffprobe_path.to_string(),
        }
    }

    /// Argument list passed to ffprobe for `file_path`
    pub fn args(file_path: &str) -> Vec<String> {
        [
            "-hide_banner",
            "-loglevel",
            "warning",
            "-print_format",
            "json",
            "-show_streams",
            "-show_chapters",
            "-show_frames",
            "-read_intervals",
            "%+#1",
            "-show_entries",
            "frame=side_data_list",
            "-i",
            file_path,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

impl ProbePort for FfprobeAdapter {
    fn probe(&self, file_path: &str) -> EncodeResult<String> {
        debug!("Running {} on {}", self.ffprobe_path, file_path);

        let output = Command::new(&self.ffprobe_path)
            .args(Self::args(file_path))
            .output()
            .map_err(|e| EncodeError::probe(format!("failed to run {}: {}", self.ffprobe_path, e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!("ffprobe: {}", stderr.trim());
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() && !text.contains('{') {
            return Err(EncodeError::probe(format!(
                "ffprobe exited with {}",
                output.status
            )));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_request_streams_chapters_and_first_frame() {
        let args = FfprobeAdapter::args("S:/Shows/Ep 01.mkv");
        assert!(args.contains(&"-show_chapters".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "-read_intervals" && w[1] == "%+#1"));
        assert_eq!(args.last().map(String::as_str), Some("S:/Shows/Ep 01.mkv"));
    }

    #[test]
    fn test_missing_binary_is_recoverable() {
        let adapter = FfprobeAdapter::new("definitely-not-an-ffprobe-binary");
        let err = adapter.probe("a.mkv").unwrap_err();
        assert!(err.is_recoverable());
    }
}
