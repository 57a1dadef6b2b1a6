//! Stream selection and muxer mapping

pub mod audio_mapper;
pub mod mux;
pub mod subtitle_filter;

pub use audio_mapper::{default_track_index, select_tracks, AudioSelection};
pub use mux::MuxLayout;
pub use subtitle_filter::select_subtitles;
