// Plan types - the ordered stage list handed to a renderer

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::domain::model::{AudioTrack, SubtitleTrack};
use crate::error::{EncodeError, EncodeResult};

/// What a stage does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageKind {
    VideoEncode,
    AudioEncode,
    SubtitleExtract,
    Premux,
    Mux,
    Cleanup,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::VideoEncode => "VIDEO_ENCODE",
            StageKind::AudioEncode => "AUDIO_ENCODE",
            StageKind::SubtitleExtract => "SUBTITLE_EXTRACT",
            StageKind::Premux => "PREMUX",
            StageKind::Mux => "MUX",
            StageKind::Cleanup => "CLEANUP",
        };
        f.pad(name)
    }
}

/// Which external tool a stage invokes; the renderer maps these to paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    VideoEncoder,
    AudioEncoder,
    SubtitleExtractor,
    Premuxer,
    Muxer,
    Remover,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageInput {
    pub path: String,
    pub note: String,
}

impl StageInput {
    pub fn new(path: &str, note: &str) -> Self {
        Self {
            path: path.to_string(),
            note: note.to_string(),
        }
    }
}

/// One abstract tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub kind: StageKind,
    pub tool: ToolId,
    pub args: Vec<String>,
    pub inputs: Vec<StageInput>,
    /// Absent only for cleanup
    pub output: Option<String>,
}

/// Why a muxer input exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MuxPurpose {
    Video,
    Audio,
    Chapters,
    Subtitle,
}

impl MuxPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            MuxPurpose::Video => "video",
            MuxPurpose::Audio => "audio",
            MuxPurpose::Chapters => "chapters",
            MuxPurpose::Subtitle => "subtitle",
        }
    }
}

/// One muxer input; its position in [`Plan::mux_inputs`] is its input index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MuxInput {
    pub path: String,
    /// Stream selector relative to this input, e.g. `v:0`, `a`, `s:0`
    pub selector: Option<String>,
    pub purpose: MuxPurpose,
}

/// Which automatic audio rule changed the requested profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum AudioSubstitution {
    /// Multichannel target on a stereo-or-less source
    AvoidUpmix { from: String, to: String },
    /// Source already satisfies the target
    StreamCopy { from: String, codec: String, channels: u32 },
}

/// Outcome of the smart decision pass for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmartDecision {
    pub requested_audio_profile: String,
    pub effective_audio_profile: String,
    pub video_is_copy: bool,
    pub kept_audio_tracks: Vec<AudioTrack>,
    pub kept_subtitle_tracks: Vec<SubtitleTrack>,
    /// Output-local index of the audio track flagged default
    pub default_audio_output_index: Option<usize>,
    pub include_chapters: bool,
    pub substitutions: Vec<AudioSubstitution>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    ProbeDegraded,
    LanguageFallback,
    NoAudio,
}

/// Non-fatal condition surfaced next to the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl PlanWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Complete, immutable job plan for one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub source: String,
    pub final_output: String,
    pub decision: SmartDecision,
    pub stages: Vec<Stage>,
    pub mux_inputs: Vec<MuxInput>,
    pub cleanup: Vec<String>,
    pub warnings: Vec<PlanWarning>,
}

impl Plan {
    pub fn stages_of(&self, kind: StageKind) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(move |s| s.kind == kind)
    }

    pub fn stage(&self, kind: StageKind) -> Option<&Stage> {
        self.stages_of(kind).next()
    }

    /// Highest input index the muxer references
    pub fn highest_mux_index(&self) -> Option<usize> {
        self.mux_inputs.len().checked_sub(1)
    }

    /// Check the muxer index layout and output uniqueness
    pub fn validate(&self) -> EncodeResult<()> {
        let mux_count = self.stages_of(StageKind::Mux).count();
        if mux_count != 1 {
            return Err(EncodeError::consistency(format!(
                "expected one mux stage, found {}",
                mux_count
            )));
        }

        let purposes: Vec<MuxPurpose> = self.mux_inputs.iter().map(|m| m.purpose).collect();
        if purposes.first() != Some(&MuxPurpose::Video) || purposes.get(1) != Some(&MuxPurpose::Audio) {
            return Err(EncodeError::consistency(
                "mux inputs must start with video then audio",
            ));
        }

        let rest = &purposes[2..];
        let chapters = rest.iter().take_while(|p| **p == MuxPurpose::Chapters).count();
        if chapters > 1 || rest[chapters..].iter().any(|p| *p != MuxPurpose::Subtitle) {
            return Err(EncodeError::consistency(
                "chapter input must precede subtitle inputs",
            ));
        }
        if chapters == 1 && !self.decision.include_chapters {
            return Err(EncodeError::consistency("chapter input without chapters"));
        }

        let subtitles = rest.len() - chapters;
        let extracts = self.stages_of(StageKind::SubtitleExtract).count();
        if subtitles != extracts || subtitles != self.decision.kept_subtitle_tracks.len() {
            return Err(EncodeError::consistency(format!(
                "{} subtitle inputs for {} extract stages",
                subtitles, extracts
            )));
        }

        let mut outputs = HashSet::new();
        for output in self.stages.iter().filter_map(|s| s.output.as_deref()) {
            if !outputs.insert(output) {
                return Err(EncodeError::consistency(format!(
                    "duplicate stage output {}",
                    output
                )));
            }
        }

        if outputs.contains(self.source.as_str()) {
            return Err(EncodeError::consistency(format!(
                "stage output would overwrite the source {}",
                self.source
            )));
        }
        if self.mux_inputs.iter().any(|m| m.path == self.final_output) {
            return Err(EncodeError::consistency(format!(
                "mux reads and writes {}",
                self.final_output
            )));
        }

        if self
            .cleanup
            .iter()
            .any(|p| *p == self.final_output || *p == self.source)
        {
            return Err(EncodeError::consistency(
                "cleanup must not remove the source or the final output",
            ));
        }

        Ok(())
    }
}
