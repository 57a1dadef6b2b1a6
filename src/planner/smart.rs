//! Smart decision pass: effective profiles, kept tracks and default flags

use tracing::{debug, info, warn};

use crate::domain::model::{AudioTrack, JobRequest, MediaDescriptor};
use crate::domain::plan::{AudioSubstitution, PlanWarning, SmartDecision, WarningKind};
use crate::error::EncodeResult;
use crate::profiles::{ProfileTable, ResolvedAudio, ResolvedVideo, COPY, DEFAULT};
use crate::streams::{default_track_index, select_subtitles, select_tracks};

const OPUS_8_6: &str = "opus-8-6";
const OPUS_5_1: &str = "opus-5.1";
const OPUS_STEREO: &str = "opus-stereo";
const OPUS_PANS: &str = "opus-pans";

/// Codecs that survive a stream copy as a bare elementary file
const RAW_AUDIO_EXTENSIONS: [&str; 6] = ["aac", "ac3", "eac3", "dts", "flac", "mp3"];

/// Everything the compiler needs to know about one file before building stages
#[derive(Debug, Clone)]
pub struct Decisions {
    pub decision: SmartDecision,
    pub video: ResolvedVideo,
    pub audio: ResolvedAudio,
    /// Extension of the audio-stage output
    pub audio_extension: String,
    pub warnings: Vec<PlanWarning>,
}

/// Run every selection and substitution rule for one file
pub fn decide(
    descriptor: &MediaDescriptor,
    request: &JobRequest,
    profiles: &ProfileTable,
) -> EncodeResult<Decisions> {
    let mut warnings = Vec::new();

    let video = profiles.resolve_video(&request.video_profile, &request.extra_args)?;
    // Unknown keys fail here even when a substitution would replace them.
    profiles.resolve_audio(&request.audio_profile, &request.extra_args)?;

    let selection = select_tracks(&descriptor.audio_tracks, &request.lang_filter);
    if selection.fell_back {
        warnings.push(PlanWarning::new(
            WarningKind::LanguageFallback,
            format!(
                "no audio track matches {:?}; keeping all {} tracks",
                request.lang_filter,
                selection.tracks.len()
            ),
        ));
    }
    if selection.tracks.is_empty() {
        warn!("Source has no audio tracks; mapping audio optionally");
        warnings.push(PlanWarning::new(
            WarningKind::NoAudio,
            "source has no audio tracks",
        ));
    }

    let (effective, substitutions) =
        smart_audio_profile(&request.audio_profile, selection.tracks.first());
    let audio = profiles.resolve_audio(&effective, &request.extra_args)?;
    let audio_extension = audio_extension(&audio, &selection.tracks);

    let default_audio_output_index =
        default_track_index(&selection.tracks, request.default_lang.as_deref());
    let kept_subtitle_tracks = select_subtitles(&descriptor.subtitle_tracks);

    info!(
        video = %request.video_profile,
        requested_audio = %request.audio_profile,
        effective_audio = %effective,
        audio_tracks = selection.tracks.len(),
        subtitles = kept_subtitle_tracks.len(),
        chapters = descriptor.has_chapters,
        "Smart decisions made"
    );

    Ok(Decisions {
        decision: SmartDecision {
            requested_audio_profile: request.audio_profile.clone(),
            effective_audio_profile: effective,
            video_is_copy: video.is_copy(),
            kept_audio_tracks: selection.tracks,
            kept_subtitle_tracks,
            default_audio_output_index,
            include_chapters: descriptor.has_chapters,
            substitutions,
        },
        video,
        audio,
        audio_extension,
        warnings,
    })
}

/// Apply the automatic audio rules against the first kept track.
///
/// Only the first track is inspected; sources with mixed codecs across
/// tracks need an explicit profile.
pub fn smart_audio_profile(
    requested: &str,
    first: Option<&AudioTrack>,
) -> (String, Vec<AudioSubstitution>) {
    let mut profile = requested.to_string();
    let mut substitutions = Vec::new();

    let track = match first {
        Some(track) if requested != COPY => track,
        _ => return (profile, substitutions),
    };
    let channels = track.channels;

    if profile == OPUS_8_6 && channels <= 2 {
        info!("Source has {} channels; using {} instead of {}", channels, OPUS_STEREO, OPUS_8_6);
        substitutions.push(AudioSubstitution::AvoidUpmix {
            from: profile.clone(),
            to: OPUS_STEREO.to_string(),
        });
        profile = OPUS_STEREO.to_string();
    }

    let copy = match track.codec.as_str() {
        "opus" => match profile.as_str() {
            DEFAULT => true,
            OPUS_5_1 | OPUS_8_6 => channels == 6,
            OPUS_STEREO | OPUS_PANS => channels == 2,
            _ => false,
        },
        "aac" => !implies_downmix(&profile, channels),
        _ => {
            if profile == OPUS_8_6 && channels > 6 {
                info!("Downmixing {} channels to 5.1 opus", channels);
            }
            false
        }
    };

    if copy {
        info!(
            codec = %track.codec,
            channels,
            "Source audio already satisfies {}; copying",
            profile
        );
        substitutions.push(AudioSubstitution::StreamCopy {
            from: profile,
            codec: track.codec.clone(),
            channels,
        });
        profile = COPY.to_string();
    } else {
        debug!(codec = %track.codec, channels, "Encoding audio with {}", profile);
    }

    (profile, substitutions)
}

fn implies_downmix(profile: &str, channels: u32) -> bool {
    match profile {
        OPUS_STEREO | OPUS_PANS => channels > 2,
        OPUS_8_6 => channels > 6,
        _ => false,
    }
}

/// A single copied track with a raw elementary format keeps its codec as the
/// extension; anything else lands in the profile's container.
fn audio_extension(audio: &ResolvedAudio, kept: &[AudioTrack]) -> String {
    if audio.is_copy() {
        if let [track] = kept {
            if RAW_AUDIO_EXTENSIONS.contains(&track.codec.as_str()) {
                return track.codec.clone();
            }
        }
    }
    audio.extension.clone()
}
