//! Muxer input bookkeeping
//!
//! The input list and the map list handed to the muxer are both projections
//! of one ordered [`MuxInput`] list, so an input's index and the index its
//! maps refer to cannot drift apart.

use crate::domain::plan::{MuxInput, MuxPurpose};

/// Ordered muxer inputs: video, audio, optional chapter source, subtitles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxLayout {
    inputs: Vec<MuxInput>,
}

impl MuxLayout {
    /// Video at index 0, the audio-stage output at index 1, then the chapter
    /// source at index 2 when given
    pub fn new(video: &str, audio: &str, chapters: Option<&str>) -> Self {
        let mut inputs = vec![
            MuxInput {
                path: video.to_string(),
                selector: Some("v:0".to_string()),
                purpose: MuxPurpose::Video,
            },
            MuxInput {
                path: audio.to_string(),
                selector: Some("a".to_string()),
                purpose: MuxPurpose::Audio,
            },
        ];
        if let Some(source) = chapters {
            inputs.push(MuxInput {
                path: source.to_string(),
                selector: None,
                purpose: MuxPurpose::Chapters,
            });
        }
        Self { inputs }
    }

    /// Append a subtitle-extract output; returns its input index
    pub fn push_subtitle(&mut self, path: &str) -> usize {
        self.inputs.push(MuxInput {
            path: path.to_string(),
            selector: Some("s:0".to_string()),
            purpose: MuxPurpose::Subtitle,
        });
        self.inputs.len() - 1
    }

    pub fn inputs(&self) -> &[MuxInput] {
        &self.inputs
    }

    pub fn into_inputs(self) -> Vec<MuxInput> {
        self.inputs
    }

    /// `-i <path>` for every input, in index order
    pub fn input_args(&self) -> Vec<String> {
        self.inputs
            .iter()
            .flat_map(|input| ["-i".to_string(), input.path.clone()])
            .collect()
    }

    /// Stream maps in index order. Without a chapter input the muxer is told
    /// to drop chapters.
    pub fn map_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        let mut has_chapters = false;

        for (index, input) in self.inputs.iter().enumerate() {
            match (input.purpose, input.selector.as_deref()) {
                (MuxPurpose::Chapters, _) => {
                    has_chapters = true;
                    args.push("-map_chapters".to_string());
                    args.push(index.to_string());
                }
                (_, Some(selector)) => {
                    args.push("-map".to_string());
                    args.push(format!("{}:{}", index, selector));
                }
                (_, None) => {}
            }
        }

        if !has_chapters {
            args.push("-map_chapters".to_string());
            args.push("-1".to_string());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_without_chapters() {
        let mut layout = MuxLayout::new("w/a__.mkv", "w/a.opus", None);
        assert_eq!(layout.push_subtitle("w/a_eng_2.srt"), 2);

        assert_eq!(
            layout.input_args(),
            vec!["-i", "w/a__.mkv", "-i", "w/a.opus", "-i", "w/a_eng_2.srt"]
        );
        assert_eq!(
            layout.map_args(),
            vec!["-map", "0:v:0", "-map", "1:a", "-map", "2:s:0", "-map_chapters", "-1"]
        );
    }

    #[test]
    fn test_chapters_take_index_two() {
        let mut layout = MuxLayout::new("src.mkv", "w/src.mka", Some("src.mkv"));
        assert_eq!(layout.push_subtitle("w/src_eng_3.ass"), 3);
        assert_eq!(layout.push_subtitle("w/src_eng_forced_4.ass"), 4);

        let purposes: Vec<MuxPurpose> = layout.inputs().iter().map(|i| i.purpose).collect();
        assert_eq!(
            purposes,
            vec![
                MuxPurpose::Video,
                MuxPurpose::Audio,
                MuxPurpose::Chapters,
                MuxPurpose::Subtitle,
                MuxPurpose::Subtitle
            ]
        );
        assert_eq!(
            layout.map_args(),
            vec![
                "-map", "0:v:0", "-map", "1:a", "-map_chapters", "2", "-map", "3:s:0", "-map",
                "4:s:0"
            ]
        );
    }
}
