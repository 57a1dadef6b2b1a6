//! Command implementations

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::adapters::{AppConfig, FfprobeAdapter, PowerShellRenderer};
use crate::app::BatchInteractor;
use crate::cli::args::{EncodeArgs, PlanArgs, ProfilesArgs, RequestArgs};
use crate::domain::model::{parse_extra_arg, JobRequest};
use crate::domain::plan::Plan;
use crate::planner::{compile, compile_degraded};
use crate::ports::RenderPort;
use crate::probe::normalize;
use crate::profiles::OptionArgs;
use crate::utils::path;

/// Execute the encode command
pub fn encode(args: EncodeArgs) -> Result<()> {
    let config = load_config(args.request.config.as_deref())?;
    let profiles = config
        .profile_table()
        .context("Invalid profile in configuration")?;
    let request = build_request(&args.path, &args.prefix, &args.request, &config)?;

    info!("Target: {}", request.target);
    info!("Profiles: video={} audio={}", request.video_profile, request.audio_profile);

    let probe = Arc::new(FfprobeAdapter::new(&config.tools.prober));
    let interactor = BatchInteractor::new(probe, profiles);
    let report = interactor
        .run(&request, args.recursive)
        .context("Failed to plan batch")?;

    if report.degraded > 0 {
        warn!("{} files were planned with default media info", report.degraded);
    }

    let job_dir = args
        .job_path
        .unwrap_or_else(|| config.paths.job_dir.clone());
    let renderer = PowerShellRenderer::new(config.tools.clone(), &job_dir);

    if args.dry_run {
        for (script, body) in renderer.render_scripts(&report.plans) {
            println!("# {}", renderer.script_path(&request.prefix, script));
            print!("{}", body);
        }
        return Ok(());
    }

    let written = renderer
        .render(&request.prefix, &report.plans)
        .context("Failed to write job scripts")?;

    println!("\nDone. Created:");
    for file in written {
        println!("- {}", file);
    }
    Ok(())
}

/// Execute the plan command
pub fn plan(args: PlanArgs) -> Result<()> {
    let config = load_config(args.request.config.as_deref())?;
    let profiles = config
        .profile_table()
        .context("Invalid profile in configuration")?;

    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read probe output {}", args.file.display()))?;
    let source = args
        .source
        .clone()
        .unwrap_or_else(|| default_source(&args.file));

    let request = build_request(&source, "plan", &args.request, &config)?;
    request.validate(&profiles)?;

    let plan = match normalize(&raw) {
        Ok(descriptor) => compile(&source, &descriptor, &request, &profiles)?,
        Err(e) => compile_degraded(&source, &e.to_string(), &request, &profiles)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

/// Execute the profiles command
pub fn profiles(args: ProfilesArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let table = config
        .profile_table()
        .context("Invalid profile in configuration")?;
    let rows = table.describe();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in rows {
        let params: Vec<String> = row
            .params
            .iter()
            .map(|p| format!("{}={}", p.aliases.join("|"), p.default))
            .collect();
        let extension = row.extension.map(|e| format!(" (.{})", e)).unwrap_or_default();
        println!("{:<6} {:<12} {}{}", row.kind, row.key, params.join(" "), extension);
    }
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load(explicit).context("Failed to load configuration")
}

/// CLI values win over configuration for the work directory
fn build_request(
    target: &str,
    prefix: &str,
    args: &RequestArgs,
    config: &AppConfig,
) -> Result<JobRequest> {
    let work_dir = args
        .out_path
        .clone()
        .unwrap_or_else(|| config.paths.work_dir.clone());

    let mut builder = JobRequest::builder(target, prefix)
        .work_dir(&work_dir)
        .video_profile(&args.video)
        .audio_profile(&args.audio)
        .resize(&args.resize)
        .crop(&args.crop)
        .vpp(&args.vpp)
        .langs(&args.lang)
        .default_lang(args.default_lang.as_deref())
        .title(args.title.as_deref());

    for raw in &args.set {
        let (key, value) = parse_extra_arg(raw);
        builder = builder.extra(&key, value);
    }

    Ok(builder.build()?)
}

/// `dir/episode.json` -> `dir/episode.mkv`
fn default_source(probe_file: &Path) -> String {
    let file = path::canonical(&probe_file.to_string_lossy());
    let name = path::file_name(&file);
    let dir = &file[..file.len() - name.len()];
    format!("{}{}", dir, path::swap_ext(name, "mkv", ""))
}

fn print_plan(plan: &Plan) {
    println!("Source: {}", plan.source);
    println!("Output: {}", plan.final_output);
    println!(
        "Audio:  {} -> {}",
        plan.decision.requested_audio_profile, plan.decision.effective_audio_profile
    );
    println!();

    for stage in &plan.stages {
        println!("{:<16} {}", stage.kind, OptionArgs::new(stage.args.iter()));
    }

    for warning in &plan.warnings {
        println!("warning: {}", warning.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_source_swaps_extension() {
        assert_eq!(default_source(Path::new("probes/Ep 01.json")), "probes/Ep 01.mkv");
        assert_eq!(default_source(Path::new("movie")), "movie.mkv");
    }
}
