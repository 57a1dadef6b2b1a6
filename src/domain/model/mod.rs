// Domain models - Core types and data structures

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{EncodeError, EncodeResult, ProfileKind};
use crate::profiles::ProfileTable;

/// Audio stream as found in the source container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioTrack {
    /// Container stream index; `None` when the track is assumed, not probed
    pub stream_index: Option<u32>,
    pub codec: String,
    pub channels: u32,
    pub lang: String,
    pub is_default: bool,
}

impl AudioTrack {
    pub fn new(stream_index: u32, codec: &str, channels: u32, lang: &str, is_default: bool) -> Self {
        Self {
            stream_index: Some(stream_index),
            codec: codec.to_lowercase(),
            channels,
            lang: lang.to_lowercase(),
            is_default,
        }
    }

    /// Track whose container index is unknown
    pub fn assumed(codec: &str, channels: u32) -> Self {
        Self {
            stream_index: None,
            ..Self::new(0, codec, channels, "und", false)
        }
    }

    /// ffmpeg `-map` selector for the `position`-th audio track of input 0.
    /// Assumed tracks bind by audio position, never by container index.
    pub fn map_selector(&self, position: usize) -> String {
        match self.stream_index {
            Some(index) => format!("0:{}", index),
            None => format!("0:a:{}?", position),
        }
    }
}

/// Subtitle stream as found in the source container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleTrack {
    pub stream_index: u32,
    pub codec: String,
    pub lang: String,
    pub title: String,
    pub forced: bool,
    /// Hearing-impaired disposition flag
    pub sdh: bool,
}

impl SubtitleTrack {
    pub fn new(stream_index: u32, codec: &str, lang: &str) -> Self {
        Self {
            stream_index,
            codec: codec.to_lowercase(),
            lang: lang.to_lowercase(),
            title: String::new(),
            forced: false,
            sdh: false,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn forced(mut self) -> Self {
        self.forced = true;
        self
    }

    pub fn hearing_impaired(mut self) -> Self {
        self.sdh = true;
        self
    }

    /// Hearing-impaired either by disposition or by an "SDH" title
    pub fn is_hearing_impaired(&self) -> bool {
        self.sdh || self.title.to_lowercase().contains("sdh")
    }
}

/// Canonical view of one input file, built once from probe output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaDescriptor {
    pub width: u32,
    pub height: u32,
    pub video_codec: String,
    pub is_hdr: bool,
    /// `G(x,y)B(x,y)R(x,y)WP(x,y)L(max,min)`
    pub hdr_mastering: Option<String>,
    pub color_primaries: Option<String>,
    pub audio_tracks: Vec<AudioTrack>,
    pub subtitle_tracks: Vec<SubtitleTrack>,
    pub has_chapters: bool,
}

impl Default for MediaDescriptor {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            video_codec: "unknown".to_string(),
            is_hdr: false,
            hdr_mastering: None,
            color_primaries: None,
            audio_tracks: Vec::new(),
            subtitle_tracks: Vec::new(),
            has_chapters: false,
        }
    }
}

impl MediaDescriptor {
    /// Descriptor used when a file could not be probed: SDR 1080p with one
    /// opus track of unknown layout.
    pub fn fallback() -> Self {
        Self {
            width: 1920,
            height: 1080,
            audio_tracks: vec![AudioTrack::assumed("opus", 0)],
            ..Self::default()
        }
    }

    pub fn primary_audio(&self) -> Option<&AudioTrack> {
        self.audio_tracks.first()
    }
}

/// Value of a free-form `--set key[=value]` argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Text(String),
    Flag(bool),
}

impl fmt::Display for ExtraValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraValue::Text(text) => write!(f, "{}", text),
            ExtraValue::Flag(flag) => write!(f, "{}", flag),
        }
    }
}

/// User-supplied template parameters, ordered for deterministic output
pub type ExtraArgs = BTreeMap<String, ExtraValue>;

/// Parse `key=value` into a text argument and a bare `key` into a flag
pub fn parse_extra_arg(raw: &str) -> (String, ExtraValue) {
    match raw.split_once('=') {
        Some((key, value)) => (key.to_string(), ExtraValue::Text(value.to_string())),
        None => (raw.to_string(), ExtraValue::Flag(true)),
    }
}

/// Output resolution modifier, `WxH`; rendered exactly as written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
    text: String,
}

impl Resize {
    /// Target frame size, for level selection
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl FromStr for Resize {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EncodeError::InvalidResize {
            value: s.to_string(),
        };
        let (w, h) = s.split_once('x').ok_or_else(invalid)?;
        Ok(Self {
            width: parse_digits(w).ok_or_else(invalid)?,
            height: parse_digits(h).ok_or_else(invalid)?,
            text: s.to_string(),
        })
    }
}

impl fmt::Display for Resize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Crop modifier, `L,T,R,B` in pixels; rendered exactly as written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crop {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    text: String,
}

impl FromStr for Crop {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EncodeError::InvalidCrop {
            value: s.to_string(),
        };
        let parts: Vec<u32> = s
            .split(',')
            .map(parse_digits)
            .collect::<Option<_>>()
            .ok_or_else(invalid)?;
        match parts.as_slice() {
            [left, top, right, bottom] => Ok(Self {
                left: *left,
                top: *top,
                right: *right,
                bottom: *bottom,
                text: s.to_string(),
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Digits only; rejects signs, whitespace and empty strings.
/// Values past `u32::MAX` saturate.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse().unwrap_or(u32::MAX))
}

/// Encoder-side video post-processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VppMode {
    None,
    #[default]
    Edge,
    Deband,
    Both,
}

impl VppMode {
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            VppMode::None => &[],
            VppMode::Edge => &["--vpp-edgelevel"],
            VppMode::Deband => &["--vpp-deband"],
            VppMode::Both => &["--vpp-edgelevel", "--vpp-deband"],
        }
    }
}

impl FromStr for VppMode {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(VppMode::None),
            "" | "edge" => Ok(VppMode::Edge),
            "deband" => Ok(VppMode::Deband),
            "both" => Ok(VppMode::Both),
            _ => Err(EncodeError::InvalidVpp {
                value: s.to_string(),
            }),
        }
    }
}

/// Resolved user intent for one batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRequest {
    pub target: String,
    pub prefix: String,
    /// Canonical forward-slash directory for intermediates and final output
    pub work_dir: String,
    pub video_profile: String,
    pub audio_profile: String,
    pub resize: Option<Resize>,
    pub crop: Option<Crop>,
    pub vpp: VppMode,
    /// Case-folded language codes; empty keeps every audio track
    pub lang_filter: BTreeSet<String>,
    pub default_lang: Option<String>,
    /// `Some("")` strips the title
    pub title_override: Option<String>,
    pub extra_args: ExtraArgs,
}

impl JobRequest {
    pub fn builder(target: &str, prefix: &str) -> JobRequestBuilder {
        JobRequestBuilder::new(target, prefix)
    }

    /// Both profile keys must exist before any file is probed
    pub fn validate(&self, profiles: &ProfileTable) -> EncodeResult<()> {
        if !profiles.contains_video(&self.video_profile) {
            return Err(EncodeError::UnknownProfile {
                kind: ProfileKind::Video,
                key: self.video_profile.clone(),
            });
        }
        if !profiles.contains_audio(&self.audio_profile) {
            return Err(EncodeError::UnknownProfile {
                kind: ProfileKind::Audio,
                key: self.audio_profile.clone(),
            });
        }
        Ok(())
    }
}

/// Collects raw CLI strings and validates them into a [`JobRequest`]
#[derive(Debug, Clone)]
pub struct JobRequestBuilder {
    target: String,
    prefix: String,
    work_dir: String,
    video_profile: String,
    audio_profile: String,
    resize: String,
    crop: String,
    vpp: String,
    langs: Vec<String>,
    default_lang: Option<String>,
    title_override: Option<String>,
    extra_args: ExtraArgs,
}

impl JobRequestBuilder {
    pub fn new(target: &str, prefix: &str) -> Self {
        Self {
            target: target.to_string(),
            prefix: prefix.to_string(),
            work_dir: "./".to_string(),
            video_profile: "default".to_string(),
            audio_profile: "default".to_string(),
            resize: String::new(),
            crop: String::new(),
            vpp: String::new(),
            langs: Vec::new(),
            default_lang: None,
            title_override: None,
            extra_args: ExtraArgs::new(),
        }
    }

    pub fn work_dir(mut self, dir: &str) -> Self {
        self.work_dir = dir.to_string();
        self
    }

    pub fn video_profile(mut self, key: &str) -> Self {
        self.video_profile = key.to_string();
        self
    }

    pub fn audio_profile(mut self, key: &str) -> Self {
        self.audio_profile = key.to_string();
        self
    }

    pub fn resize(mut self, value: &str) -> Self {
        self.resize = value.to_string();
        self
    }

    pub fn crop(mut self, value: &str) -> Self {
        self.crop = value.to_string();
        self
    }

    pub fn vpp(mut self, value: &str) -> Self {
        self.vpp = value.to_string();
        self
    }

    pub fn langs<I, S>(mut self, langs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.langs = langs.into_iter().map(|l| l.as_ref().to_string()).collect();
        self
    }

    pub fn default_lang(mut self, lang: Option<&str>) -> Self {
        self.default_lang = lang.map(str::to_string);
        self
    }

    pub fn title(mut self, title: Option<&str>) -> Self {
        self.title_override = title.map(str::to_string);
        self
    }

    pub fn extra(mut self, key: &str, value: ExtraValue) -> Self {
        self.extra_args.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> EncodeResult<JobRequest> {
        if self.target.trim().is_empty() {
            return Err(EncodeError::MissingInput {
                field: "path".to_string(),
            });
        }
        if self.prefix.trim().is_empty() {
            return Err(EncodeError::MissingInput {
                field: "prefix".to_string(),
            });
        }

        let resize = match self.resize.trim() {
            "" => None,
            raw => Some(raw.parse::<Resize>()?),
        };
        let crop = match self.crop.trim() {
            "" => None,
            raw => Some(raw.parse::<Crop>()?),
        };
        let vpp = self.vpp.trim().parse::<VppMode>()?;

        let lang_filter = self
            .langs
            .iter()
            .flat_map(|l| l.split(','))
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();

        Ok(JobRequest {
            target: self.target,
            prefix: self.prefix,
            work_dir: crate::utils::path::canonical_dir(&self.work_dir),
            video_profile: self.video_profile,
            audio_profile: self.audio_profile,
            resize,
            crop,
            vpp,
            lang_filter,
            default_lang: self
                .default_lang
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty()),
            title_override: self.title_override,
            extra_args: self.extra_args,
        })
    }
}
