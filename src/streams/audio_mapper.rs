//! Audio track selection and default-flag assignment

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::domain::model::AudioTrack;

/// Tracks kept after language filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSelection {
    pub tracks: Vec<AudioTrack>,
    /// The filter matched nothing and every track was kept instead
    pub fell_back: bool,
}

/// Keep tracks whose language is in `filter`. An empty filter keeps
/// everything, and so does a filter that matches nothing.
pub fn select_tracks(tracks: &[AudioTrack], filter: &BTreeSet<String>) -> AudioSelection {
    if filter.is_empty() {
        return AudioSelection {
            tracks: tracks.to_vec(),
            fell_back: false,
        };
    }

    let kept: Vec<AudioTrack> = tracks
        .iter()
        .filter(|t| filter.contains(&t.lang.to_lowercase()))
        .cloned()
        .collect();

    if kept.is_empty() && !tracks.is_empty() {
        warn!(
            "No audio track matches languages {:?}; keeping all {} tracks",
            filter,
            tracks.len()
        );
        return AudioSelection {
            tracks: tracks.to_vec(),
            fell_back: true,
        };
    }

    debug!("Kept {} of {} audio tracks", kept.len(), tracks.len());
    AudioSelection {
        tracks: kept,
        fell_back: false,
    }
}

/// Output index of the single track that gets the default disposition.
///
/// With a preferred language, the first kept track in that language wins.
/// Otherwise the first track the source already flagged default wins.
pub fn default_track_index(kept: &[AudioTrack], default_lang: Option<&str>) -> Option<usize> {
    if let Some(lang) = default_lang.map(str::to_lowercase) {
        if let Some(position) = kept.iter().position(|t| t.lang.to_lowercase() == lang) {
            return Some(position);
        }
        debug!("No kept audio track in '{}'; using the source default flag", lang);
    }
    kept.iter().position(|t| t.is_default)
}
