//! Job plan compiler
//!
//! Turns one descriptor and one request into the ordered stage list for a
//! single file. Stage args are complete tool argument lists; the renderer
//! only prepends the executable.

use tracing::{debug, info, warn};

use crate::domain::model::{JobRequest, MediaDescriptor, SubtitleTrack};
use crate::domain::plan::{
    Plan, PlanWarning, SmartDecision, Stage, StageInput, StageKind, ToolId, WarningKind,
};
use crate::error::EncodeResult;
use crate::profiles::{OptionArgs, ProfileTable, ResolvedVideo};
use crate::streams::{subtitle_filter, MuxLayout};
use crate::utils::path;

use super::smart::{decide, Decisions};

const HDR_COLOR: [&str; 6] = [
    "--transfer",
    "smpte2084",
    "--colorprim",
    "bt2020",
    "--colormatrix",
    "bt2020nc",
];

const BT709_COLOR: [&str; 6] = [
    "--transfer",
    "bt709",
    "--colorprim",
    "bt709",
    "--colormatrix",
    "bt709",
];

/// Frames above 1920x1080 need HEVC level 5.0
fn encoder_level(width: u32, height: u32) -> &'static str {
    if width > 1920 || height > 1080 {
        "5.0"
    } else {
        "4.1"
    }
}

/// Intermediate and final paths for one source file
#[derive(Debug, Clone)]
struct OutputNames {
    video: String,
    audio: String,
    premux: String,
    final_mkv: String,
}

impl OutputNames {
    fn new(work_dir: &str, stem: &str, audio_ext: &str) -> Self {
        Self {
            video: named(work_dir, stem, "", "h265"),
            audio: named(work_dir, stem, "", audio_ext),
            premux: named(work_dir, stem, "__", "mkv"),
            final_mkv: named(work_dir, stem, "", "mkv"),
        }
    }

    /// `<stem>_<lang>[_forced]_<index>.<ext>`
    fn subtitle(work_dir: &str, stem: &str, track: &SubtitleTrack) -> String {
        let forced = if track.forced { "_forced" } else { "" };
        let suffix = format!("_{}{}_{}", track.lang, forced, track.stream_index);
        named(work_dir, stem, &suffix, subtitle_filter::extension_for(&track.codec))
    }
}

fn named(work_dir: &str, stem: &str, suffix: &str, ext: &str) -> String {
    format!("{}{}{}.{}", work_dir, stem, suffix, ext)
}

/// Compile the plan for `source`, naming outputs after its file stem
pub fn compile(
    source: &str,
    descriptor: &MediaDescriptor,
    request: &JobRequest,
    profiles: &ProfileTable,
) -> EncodeResult<Plan> {
    let stem = path::file_stem(&path::canonical(source)).to_string();
    compile_as(source, &stem, descriptor, request, profiles)
}

/// Compile the plan for `source` with every output named after `stem`
pub fn compile_as(
    source: &str,
    stem: &str,
    descriptor: &MediaDescriptor,
    request: &JobRequest,
    profiles: &ProfileTable,
) -> EncodeResult<Plan> {
    let source = path::canonical(source);
    let file_name = path::file_name(&source).to_string();
    let work_dir = path::canonical_dir(&request.work_dir);

    let Decisions {
        decision,
        video,
        audio,
        audio_extension,
        warnings,
    } = decide(descriptor, request, profiles)?;

    let names = OutputNames::new(&work_dir, stem, &audio_extension);
    let mut stages = Vec::new();
    let mut cleanup = Vec::new();

    let mux_video = match &video {
        ResolvedVideo::Copy => {
            debug!("Video copy requested; muxing video straight from the source");
            source.clone()
        }
        ResolvedVideo::Encode(profile_args) => {
            let mut args = video_args(profile_args, descriptor, request);
            args.extend([
                "-i".to_string(),
                source.clone(),
                "-o".to_string(),
                names.video.clone(),
            ]);
            stages.push(Stage {
                kind: StageKind::VideoEncode,
                tool: ToolId::VideoEncoder,
                args,
                inputs: vec![StageInput::new(&source, "source")],
                output: Some(names.video.clone()),
            });
            stages.push(Stage {
                kind: StageKind::Premux,
                tool: ToolId::Premuxer,
                args: vec!["-o".to_string(), names.premux.clone(), names.video.clone()],
                inputs: vec![StageInput::new(&names.video, "encoded video")],
                output: Some(names.premux.clone()),
            });
            cleanup.push(names.video.clone());
            cleanup.push(names.premux.clone());
            names.premux.clone()
        }
    };

    stages.push(audio_stage(&source, &names.audio, &decision, &audio.args, request));
    cleanup.push(names.audio.clone());

    let chapters = decision.include_chapters.then_some(source.as_str());
    let mut layout = MuxLayout::new(&mux_video, &names.audio, chapters);
    let mut subtitle_meta = Vec::new();

    for (n, track) in decision.kept_subtitle_tracks.iter().enumerate() {
        let out = OutputNames::subtitle(&work_dir, stem, track);
        stages.push(Stage {
            kind: StageKind::SubtitleExtract,
            tool: ToolId::SubtitleExtractor,
            args: vec![
                "-i".to_string(),
                source.clone(),
                "-map".to_string(),
                format!("0:{}", track.stream_index),
                "-c".to_string(),
                "copy".to_string(),
                out.clone(),
            ],
            inputs: vec![StageInput::new(&source, "source")],
            output: Some(out.clone()),
        });
        layout.push_subtitle(&out);
        cleanup.push(out);

        subtitle_meta.push(format!("-metadata:s:s:{}", n));
        subtitle_meta.push(format!("language={}", track.lang));
        if track.forced {
            subtitle_meta.push(format!("-disposition:s:{}", n));
            subtitle_meta.push("forced".to_string());
        }
    }

    let mut mux_args = layout.input_args();
    mux_args.extend(layout.map_args());
    mux_args.extend(subtitle_meta);
    mux_args.extend(["-c".to_string(), "copy".to_string()]);
    push_title(&mut mux_args, request);
    mux_args.push(names.final_mkv.clone());

    let mux_inputs = layout.into_inputs();
    stages.push(Stage {
        kind: StageKind::Mux,
        tool: ToolId::Muxer,
        args: mux_args,
        inputs: mux_inputs
            .iter()
            .map(|input| StageInput::new(&input.path, input.purpose.as_str()))
            .collect(),
        output: Some(names.final_mkv.clone()),
    });

    stages.push(Stage {
        kind: StageKind::Cleanup,
        tool: ToolId::Remover,
        args: cleanup.clone(),
        inputs: cleanup
            .iter()
            .map(|p| StageInput::new(p, "intermediate"))
            .collect(),
        output: None,
    });

    for warning in &warnings {
        warn!(file = %file_name, "{}", warning.message);
    }

    let plan = Plan {
        source,
        final_output: names.final_mkv,
        decision,
        stages,
        mux_inputs,
        cleanup,
        warnings,
    };
    plan.validate()?;

    info!(
        file = %file_name,
        stages = plan.stages.len(),
        output = %plan.final_output,
        "Compiled job plan"
    );
    Ok(plan)
}

/// Compile against the fallback descriptor after a failed probe
pub fn compile_degraded(
    source: &str,
    reason: &str,
    request: &JobRequest,
    profiles: &ProfileTable,
) -> EncodeResult<Plan> {
    let stem = path::file_stem(&path::canonical(source)).to_string();
    compile_degraded_as(source, &stem, reason, request, profiles)
}

/// [`compile_degraded`] with an explicit output stem
pub fn compile_degraded_as(
    source: &str,
    stem: &str,
    reason: &str,
    request: &JobRequest,
    profiles: &ProfileTable,
) -> EncodeResult<Plan> {
    warn!(file = %source, "Could not analyze file ({}); using defaults", reason);
    let mut plan = compile_as(source, stem, &MediaDescriptor::fallback(), request, profiles)?;
    plan.warnings.insert(
        0,
        PlanWarning::new(
            WarningKind::ProbeDegraded,
            format!("probe failed, defaults used: {}", reason),
        ),
    );
    Ok(plan)
}

/// Profile args, then modifiers, then level and colour signalling.
/// The level follows the resize target when one is given.
fn video_args(
    profile_args: &OptionArgs,
    descriptor: &MediaDescriptor,
    request: &JobRequest,
) -> Vec<String> {
    let mut args = profile_args.clone();

    args.extend(request.vpp.args().iter().copied());
    if let Some(resize) = &request.resize {
        args.extend(["--output-res".to_string(), resize.to_string()]);
    }
    if let Some(crop) = &request.crop {
        args.extend(["--crop".to_string(), crop.to_string()]);
    }

    let (width, height) = request
        .resize
        .as_ref()
        .map(|r| r.dimensions())
        .unwrap_or((descriptor.width, descriptor.height));
    let level = encoder_level(width, height);
    args.extend(["--level", level]);

    if descriptor.is_hdr {
        args.extend(HDR_COLOR);
        match descriptor.hdr_mastering.as_deref() {
            Some(mastering) if !mastering.is_empty() => {
                args.extend(["--master-display", mastering]);
            }
            _ => {}
        }
        info!("HDR source; level {} with BT.2020 / SMPTE 2084", level);
    } else if descriptor.color_primaries.as_deref() == Some("bt709") {
        args.extend(BT709_COLOR);
        debug!("SDR bt709 source");
    } else {
        debug!("SDR source with unknown primaries; no colour flags");
    }

    args.into_vec()
}

fn audio_stage(
    source: &str,
    output: &str,
    decision: &SmartDecision,
    profile_args: &OptionArgs,
    request: &JobRequest,
) -> Stage {
    let mut args = vec!["-i".to_string(), source.to_string()];

    if decision.kept_audio_tracks.is_empty() {
        args.extend(["-map".to_string(), "0:a?".to_string()]);
    }
    for (position, track) in decision.kept_audio_tracks.iter().enumerate() {
        args.push("-map".to_string());
        args.push(track.map_selector(position));
    }

    args.extend(profile_args.as_slice().iter().cloned());

    for n in 0..decision.kept_audio_tracks.len() {
        args.push(format!("-disposition:a:{}", n));
        let flag = if decision.default_audio_output_index == Some(n) {
            "default"
        } else {
            "0"
        };
        args.push(flag.to_string());
    }

    push_title(&mut args, request);
    args.push(output.to_string());

    Stage {
        kind: StageKind::AudioEncode,
        tool: ToolId::AudioEncoder,
        args,
        inputs: vec![StageInput::new(source, "source")],
        output: Some(output.to_string()),
    }
}

/// `-metadata title=<t>`; an empty override strips the title
fn push_title(args: &mut Vec<String>, request: &JobRequest) {
    if let Some(title) = &request.title_override {
        args.push("-metadata".to_string());
        args.push(format!("title={}", title));
    }
}
