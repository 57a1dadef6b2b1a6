//! Probe output normalization
//!
//! Turns the JSON printed by `ffprobe -print_format json -show_streams
//! -show_chapters -show_frames` into a [`MediaDescriptor`]. Tag keys are
//! lower-cased once here so nothing downstream has to care whether the
//! container wrote `language` or `LANGUAGE`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::model::{AudioTrack, MediaDescriptor, SubtitleTrack};
use crate::error::{EncodeError, EncodeResult};

pub mod mastering;

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawProbe {
    streams: Vec<RawStream>,
    #[serde(default)]
    chapters: Vec<Value>,
    #[serde(default)]
    frames: Vec<RawFrame>,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    index: Option<u32>,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    channels: Option<u32>,
    color_primaries: Option<String>,
    #[serde(default)]
    disposition: BTreeMap<String, Value>,
    #[serde(default)]
    tags: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawFrame {
    #[serde(default)]
    pub(crate) side_data_list: Vec<BTreeMap<String, Value>>,
}

/// Stream tags with keys folded to lower case
struct Tags(BTreeMap<String, String>);

impl Tags {
    fn from_raw(raw: &BTreeMap<String, Value>) -> Self {
        Tags(
            raw.iter()
                .map(|(k, v)| (k.to_lowercase(), value_to_string(v)))
                .collect(),
        )
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}

impl RawStream {
    fn flag(&self, name: &str) -> bool {
        match self.disposition.get(name) {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0) != 0,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn codec(&self) -> String {
        self.codec_name
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or("unknown")
            .to_lowercase()
    }
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize raw probe output. Anything before the first `{` or after the
/// last `}` (tool warnings on the same stream) is ignored.
pub fn normalize(raw: &str) -> EncodeResult<MediaDescriptor> {
    let (first, last) = match (raw.find('{'), raw.rfind('}')) {
        (Some(first), Some(last)) if first < last => (first, last),
        _ => return Err(EncodeError::probe("probe output contains no JSON object")),
    };

    let value: Value = serde_json::from_str(&raw[first..=last])
        .map_err(|e| EncodeError::probe(format!("probe JSON parse error: {}", e)))?;
    normalize_value(value)
}

/// Normalize an already-parsed probe document
pub fn normalize_value(value: Value) -> EncodeResult<MediaDescriptor> {
    let probe: RawProbe = serde_json::from_value(value)
        .map_err(|e| EncodeError::probe(format!("unexpected probe layout: {}", e)))?;

    let mut descriptor = MediaDescriptor::default();
    let mut seen_video = false;

    for (position, stream) in probe.streams.iter().enumerate() {
        let stream_index = stream.index.unwrap_or(position as u32);
        let tags = Tags::from_raw(&stream.tags);

        match stream.codec_type.as_deref() {
            Some("video") if !seen_video => {
                seen_video = true;
                descriptor.width = stream.width.unwrap_or(0);
                descriptor.height = stream.height.unwrap_or(0);
                descriptor.video_codec = stream.codec();
                descriptor.color_primaries = stream
                    .color_primaries
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .map(str::to_lowercase);
            }
            Some("audio") => {
                descriptor.audio_tracks.push(AudioTrack::new(
                    stream_index,
                    &stream.codec(),
                    stream.channels.unwrap_or(0),
                    tags.get("language").unwrap_or("und"),
                    stream.flag("default"),
                ));
            }
            Some("subtitle") => {
                let mut track = SubtitleTrack::new(
                    stream_index,
                    &stream.codec(),
                    tags.get("language").unwrap_or("und"),
                )
                .with_title(tags.get("title").unwrap_or(""));
                track.forced = stream.flag("forced");
                track.sdh = stream.flag("hearing_impaired");
                descriptor.subtitle_tracks.push(track);
            }
            _ => {}
        }
    }

    if !seen_video {
        warn!("Probe output has no video stream");
    }

    descriptor.has_chapters = !probe.chapters.is_empty();
    descriptor.hdr_mastering = mastering::find_mastering_string(&probe.frames);
    descriptor.is_hdr = descriptor.hdr_mastering.is_some();

    debug!(
        width = descriptor.width,
        height = descriptor.height,
        codec = %descriptor.video_codec,
        hdr = descriptor.is_hdr,
        audio = descriptor.audio_tracks.len(),
        subtitles = descriptor.subtitle_tracks.len(),
        chapters = descriptor.has_chapters,
        "Normalized probe output"
    );

    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    [warning] something the prober printed first
    {
        "frames": [
            { "side_data_list": [] }
        ],
        "streams": [
            { "index": 0, "codec_type": "video", "codec_name": "h264",
              "width": 1920, "height": 1080, "color_primaries": "bt709" },
            { "index": 1, "codec_type": "audio", "codec_name": "aac", "channels": 2,
              "disposition": { "default": 1 }, "tags": { "language": "eng" } },
            { "index": 2, "codec_type": "audio", "codec_name": "ac3", "channels": 6,
              "disposition": { "default": 0 }, "tags": { "LANGUAGE": "JPN" } },
            { "index": 3, "codec_type": "subtitle", "codec_name": "subrip",
              "disposition": { "forced": 0, "hearing_impaired": 1 },
              "tags": { "language": "eng", "title": "English SDH" } },
            { "index": 4, "codec_type": "subtitle", "codec_name": "subrip",
              "disposition": { "forced": 1 } },
            { "index": 5, "codec_type": "attachment", "codec_name": "ttf" }
        ],
        "chapters": [ { "id": 0, "start_time": "0.000000" } ]
    }
    "#;

    #[test]
    fn test_normalize_sample() {
        let descriptor = normalize(SAMPLE).unwrap();
        assert_eq!((descriptor.width, descriptor.height), (1920, 1080));
        assert_eq!(descriptor.video_codec, "h264");
        assert_eq!(descriptor.color_primaries.as_deref(), Some("bt709"));
        assert!(!descriptor.is_hdr);
        assert!(descriptor.has_chapters);

        assert_eq!(descriptor.audio_tracks.len(), 2);
        assert_eq!(descriptor.audio_tracks[0], AudioTrack::new(1, "aac", 2, "eng", true));
        assert_eq!(descriptor.audio_tracks[1], AudioTrack::new(2, "ac3", 6, "jpn", false));

        let subs = &descriptor.subtitle_tracks;
        assert_eq!(subs.len(), 2);
        assert!(subs[0].sdh);
        assert_eq!(subs[0].title, "English SDH");
        assert_eq!(subs[1].lang, "und");
        assert_eq!(subs[1].title, "");
        assert!(subs[1].forced);
    }

    #[test]
    fn test_missing_video_keeps_defaults() {
        let descriptor = normalize(
            r#"{"streams":[{"codec_type":"audio","codec_name":"opus"}]}"#,
        )
        .unwrap();
        assert_eq!((descriptor.width, descriptor.height), (0, 0));
        assert_eq!(descriptor.video_codec, "unknown");
        assert_eq!(descriptor.color_primaries, None);
        assert_eq!(descriptor.audio_tracks[0].channels, 0);
        assert_eq!(descriptor.audio_tracks[0].stream_index, Some(0));
        assert!(!descriptor.has_chapters);
    }

    #[test]
    fn test_only_first_video_stream_counts() {
        let descriptor = normalize(
            r#"{"streams":[
                {"index":0,"codec_type":"video","codec_name":"hevc","width":3840,"height":2160},
                {"index":1,"codec_type":"video","codec_name":"mjpeg","width":320,"height":240}
            ]}"#,
        )
        .unwrap();
        assert_eq!(descriptor.video_codec, "hevc");
        assert_eq!(descriptor.width, 3840);
    }

    #[test]
    fn test_malformed_output_is_probe_failure() {
        for raw in ["", "ffprobe: No such file", "{ not json }", r#"{"format":{}}"#] {
            let err = normalize(raw).unwrap_err();
            assert!(err.is_recoverable(), "{raw:?} should be a probe failure");
        }
    }
}
