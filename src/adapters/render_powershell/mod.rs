//! PowerShell job script renderer
//!
//! A batch of plans becomes four scripts that are meant to be run in order:
//! video encodes, audio encodes with subtitle extraction, muxing, cleanup.
//! Plans carry forward-slash paths; scripts get backslash paths in double
//! quotes.

use std::collections::HashSet;
use std::fs;

use tracing::info;

use crate::adapters::toml_config::ToolPaths;
use crate::domain::plan::{Plan, Stage, StageKind, ToolId};
use crate::error::EncodeResult;
use crate::ports::RenderPort;
use crate::utils::path;

/// One of the four scripts written per batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Video,
    Audio,
    Mux,
    Cleanup,
}

impl Script {
    pub const ALL: [Script; 4] = [Script::Video, Script::Audio, Script::Mux, Script::Cleanup];

    pub fn suffix(&self) -> &'static str {
        match self {
            Script::Video => "_vid.ps1",
            Script::Audio => "_aud.ps1",
            Script::Mux => "_mux.ps1",
            Script::Cleanup => "_del.ps1",
        }
    }

    fn for_stage(kind: StageKind) -> Script {
        match kind {
            StageKind::VideoEncode => Script::Video,
            StageKind::AudioEncode | StageKind::SubtitleExtract => Script::Audio,
            StageKind::Premux | StageKind::Mux => Script::Mux,
            StageKind::Cleanup => Script::Cleanup,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PowerShellRenderer {
    tools: ToolPaths,
    job_dir: String,
}

impl PowerShellRenderer {
    pub fn new(tools: ToolPaths, job_dir: &str) -> Self {
        Self {
            tools,
            job_dir: path::canonical_dir(job_dir),
        }
    }

    /// Script file path for `prefix`
    pub fn script_path(&self, prefix: &str, script: Script) -> String {
        format!("{}{}{}", self.job_dir, prefix, script.suffix())
    }

    /// Script bodies in [`Script::ALL`] order
    pub fn render_scripts(&self, plans: &[Plan]) -> Vec<(Script, String)> {
        Script::ALL
            .iter()
            .map(|script| {
                let body: String = plans
                    .iter()
                    .flat_map(|plan| plan.stages.iter())
                    .filter(|stage| Script::for_stage(stage.kind) == *script)
                    .map(|stage| self.render_stage(stage))
                    .collect();
                (*script, body)
            })
            .collect()
    }

    fn render_stage(&self, stage: &Stage) -> String {
        if stage.tool == ToolId::Remover {
            return stage
                .args
                .iter()
                .map(|p| format!("Remove-Item {}\n", quote_path(p)))
                .collect();
        }

        let paths: HashSet<&str> = stage
            .inputs
            .iter()
            .map(|i| i.path.as_str())
            .chain(stage.output.as_deref())
            .collect();

        let mut line = format!("& {}", quote_path(self.tool_path(stage.tool)));
        for arg in &stage.args {
            line.push(' ');
            if paths.contains(arg.as_str()) {
                line.push_str(&quote_path(arg));
            } else {
                line.push_str(&quote_arg(arg));
            }
        }
        line.push('\n');
        line
    }

    fn tool_path(&self, tool: ToolId) -> &str {
        match tool {
            ToolId::VideoEncoder => &self.tools.video_encoder,
            ToolId::AudioEncoder | ToolId::SubtitleExtractor => &self.tools.audio_encoder,
            ToolId::Premuxer => &self.tools.premuxer,
            ToolId::Muxer => &self.tools.muxer,
            ToolId::Remover => "Remove-Item",
        }
    }
}

impl RenderPort for PowerShellRenderer {
    /// Scripts are replaced, never appended to
    fn render(&self, prefix: &str, plans: &[Plan]) -> EncodeResult<Vec<String>> {
        fs::create_dir_all(&self.job_dir)?;

        let mut written = Vec::new();
        for (script, body) in self.render_scripts(plans) {
            let file = self.script_path(prefix, script);
            fs::write(&file, body)?;
            written.push(file);
        }

        info!("Wrote {} job scripts to {}", written.len(), self.job_dir);
        Ok(written)
    }
}

fn quote_path(path: &str) -> String {
    format!("\"{}\"", path::to_windows(path))
}

/// Single-quote anything PowerShell would otherwise interpret
fn quote_arg(arg: &str) -> String {
    let special = |c: char| c.is_whitespace() || "|&;<>()'\"`$,{}@#?*[]".contains(c);
    if arg.is_empty() || arg.contains(special) {
        format!("'{}'", arg.replace('\'', "''"))
    } else {
        arg.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AudioTrack, JobRequest, MediaDescriptor, SubtitleTrack};
    use crate::planner::compile;
    use crate::profiles::ProfileTable;
    use tempfile::TempDir;

    fn plan(request: &JobRequest) -> Plan {
        let descriptor = MediaDescriptor {
            width: 1920,
            height: 1080,
            color_primaries: Some("bt709".into()),
            audio_tracks: vec![AudioTrack::new(1, "ac3", 6, "eng", true)],
            subtitle_tracks: vec![SubtitleTrack::new(2, "subrip", "eng")],
            ..MediaDescriptor::default()
        };
        compile("S:/Shows/Ep 01.mkv", &descriptor, request, &ProfileTable::builtin()).unwrap()
    }

    fn request() -> JobRequest {
        JobRequest::builder("S:/Shows", "SHOW")
            .work_dir("R:/enc")
            .audio_profile("opus-pans")
            .crop("0,140,0,140")
            .build()
            .unwrap()
    }

    #[test]
    fn test_stages_land_in_their_scripts() {
        let renderer = PowerShellRenderer::new(ToolPaths::default(), "./output");
        let scripts = renderer.render_scripts(&[plan(&request())]);

        let (_, video) = &scripts[0];
        assert!(video.starts_with("& \"NVEncC64.exe\" --vbrhq 1200"));
        assert!(video.contains("--crop '0,140,0,140'"));
        assert!(video.contains("-i \"S:\\Shows\\Ep 01.mkv\" -o \"R:\\enc\\Ep 01.h265\""));

        let (_, audio) = &scripts[1];
        assert_eq!(audio.lines().count(), 2);
        assert!(audio.contains("'volume=1.65,pan=stereo|FL=0.5*FC+0.707*FL+0.707*BL+0.5*LFE|FR=0.5*FC+0.707*FR+0.707*BR+0.5*LFE'"));
        assert!(audio.contains("\"R:\\enc\\Ep 01_eng_2.srt\""));

        let (_, mux) = &scripts[2];
        assert!(mux.lines().next().unwrap().starts_with("& \"mkvmerge.exe\" -o \"R:\\enc\\Ep 01__.mkv\""));
        assert!(mux.lines().nth(1).unwrap().ends_with("-c copy \"R:\\enc\\Ep 01.mkv\""));

        let (_, cleanup) = &scripts[3];
        assert_eq!(cleanup.lines().count(), 4);
        assert!(cleanup.lines().all(|l| l.starts_with("Remove-Item \"R:\\enc\\")));
        assert!(!cleanup.contains("S:\\Shows"));
    }

    #[test]
    fn test_render_replaces_existing_scripts() {
        let dir = TempDir::new().unwrap();
        let job_dir = dir.path().to_string_lossy().to_string();
        let renderer = PowerShellRenderer::new(ToolPaths::default(), &job_dir);
        let plans = vec![plan(&request())];

        let first = renderer.render("SHOW", &plans).unwrap();
        renderer.render("SHOW", &plans).unwrap();

        assert_eq!(first.len(), 4);
        assert!(first[0].ends_with("SHOW_vid.ps1"));
        let video = fs::read_to_string(&first[0]).unwrap();
        assert_eq!(video.lines().count(), 1);
    }

    #[test]
    fn test_quote_arg() {
        assert_eq!(quote_arg("-c:a"), "-c:a");
        assert_eq!(quote_arg("title=It's On"), "'title=It''s On'");
        assert_eq!(quote_arg(""), "''");
        assert_eq!(quote_arg("0:a?"), "'0:a?'");
    }
}
