//! Subtitle track selection

use tracing::debug;

use crate::domain::model::SubtitleTrack;

const ENGLISH: [&str; 3] = ["eng", "en", "en-us"];

/// `EN_US` -> `en-us`
fn normalize_lang(lang: &str) -> String {
    lang.trim().to_lowercase().replace('_', "-")
}

/// English and not intended for the hearing impaired
pub fn is_wanted(track: &SubtitleTrack) -> bool {
    ENGLISH.contains(&normalize_lang(&track.lang).as_str()) && !track.is_hearing_impaired()
}

/// Wanted tracks in container order
pub fn select_subtitles(tracks: &[SubtitleTrack]) -> Vec<SubtitleTrack> {
    tracks
        .iter()
        .filter(|track| {
            let keep = is_wanted(track);
            if !keep {
                debug!(
                    stream = track.stream_index,
                    lang = %track.lang,
                    title = %track.title,
                    "Skipping subtitle track"
                );
            }
            keep
        })
        .cloned()
        .collect()
}

/// Extension for an extracted subtitle stream
pub fn extension_for(codec: &str) -> &'static str {
    match codec {
        "subrip" | "srt" => "srt",
        "ass" | "ssa" => "ass",
        "webvtt" => "vtt",
        "hdmv_pgs_subtitle" | "pgssub" => "sup",
        _ => "mks",
    }
}
