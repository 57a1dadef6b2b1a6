// Batch interactor - Orchestrates probing and plan compilation for a batch

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::adapters::fs_scan::scan_targets;
use crate::domain::model::JobRequest;
use crate::domain::plan::{Plan, WarningKind};
use crate::error::{EncodeError, EncodeResult};
use crate::planner::{compile_as, compile_degraded_as};
use crate::ports::ProbePort;
use crate::probe::normalize;
use crate::profiles::ProfileTable;
use crate::utils::path;

/// Plans compiled for one batch, in scan order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub plans: Vec<Plan>,
    /// Files planned from the fallback descriptor
    pub degraded: usize,
}

/// Interactor for the batch encode use case
pub struct BatchInteractor {
    probe_port: Arc<dyn ProbePort>,
    profiles: ProfileTable,
}

impl BatchInteractor {
    /// Create new batch interactor with injected ports
    pub fn new(probe_port: Arc<dyn ProbePort>, profiles: ProfileTable) -> Self {
        Self {
            probe_port,
            profiles,
        }
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    /// Validate, scan the target, then plan every file in order
    pub fn run(&self, request: &JobRequest, recursive: bool) -> EncodeResult<BatchReport> {
        request.validate(&self.profiles)?;
        let files = scan_targets(&request.target, recursive)?;
        self.run_files(request, &files)
    }

    /// Plan an already-resolved file list. Nothing is compiled when the
    /// request is invalid.
    pub fn run_files(&self, request: &JobRequest, files: &[String]) -> EncodeResult<BatchReport> {
        request.validate(&self.profiles)?;

        let stems = output_stems(files);
        let mut report = BatchReport::default();
        for (file, stem) in files.iter().zip(&stems) {
            let plan = self.plan_file_as(file, stem, request)?;
            if plan.warnings.iter().any(|w| w.kind == WarningKind::ProbeDegraded) {
                report.degraded += 1;
            }
            report.plans.push(plan);
        }
        check_batch_outputs(&report.plans)?;

        info!(
            "Planned {} files ({} with default media info)",
            report.plans.len(),
            report.degraded
        );
        Ok(report)
    }

    /// Probe and compile one file; probe failures degrade to defaults
    pub fn plan_file(&self, file: &str, request: &JobRequest) -> EncodeResult<Plan> {
        let stem = path::file_stem(&path::canonical(file)).to_string();
        self.plan_file_as(file, &stem, request)
    }

    fn plan_file_as(&self, file: &str, stem: &str, request: &JobRequest) -> EncodeResult<Plan> {
        info!("Queuing: {}", file);

        let probed = self
            .probe_port
            .probe(file)
            .and_then(|raw| normalize(&raw));

        match probed {
            Ok(descriptor) => compile_as(file, stem, &descriptor, request, &self.profiles),
            Err(e) if e.is_recoverable() => {
                warn!("Could not analyze {}: {}", file, e);
                compile_degraded_as(file, stem, &e.to_string(), request, &self.profiles)
            }
            Err(e) => Err(e),
        }
    }
}

/// Output stems that stay unique across a batch.
///
/// Outputs all land in one work directory, so files sharing a stem
/// (case-insensitively, as on Windows) are prefixed with their parent
/// directory name, then numbered if that still clashes.
fn output_stems(files: &[String]) -> Vec<String> {
    let files: Vec<String> = files.iter().map(|f| path::canonical(f)).collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for file in &files {
        *counts.entry(path::file_stem(file).to_lowercase()).or_default() += 1;
    }

    let mut used = HashSet::new();
    files
        .iter()
        .map(|file| {
            let stem = path::file_stem(file);
            let shared = counts.get(&stem.to_lowercase()).copied().unwrap_or(0) > 1;
            let base = match parent_name(file) {
                Some(parent) if shared => format!("{}_{}", parent, stem),
                _ => stem.to_string(),
            };

            let mut name = base.clone();
            let mut n = 2;
            while !used.insert(name.to_lowercase()) {
                name = format!("{}_{}", base, n);
                n += 1;
            }
            if name != stem {
                debug!("Outputs for {} renamed to {}", file, name);
            }
            name
        })
        .collect()
}

/// Name of the directory holding `file`; drive roots have none
fn parent_name(file: &str) -> Option<&str> {
    let dir = file.strip_suffix(path::file_name(file))?.trim_end_matches('/');
    let name = path::file_name(dir);
    (!name.is_empty() && !name.ends_with(':')).then_some(name)
}

/// No output may be written by two plans or land on a source file
fn check_batch_outputs(plans: &[Plan]) -> EncodeResult<()> {
    let sources: HashSet<String> = plans.iter().map(|p| p.source.to_lowercase()).collect();
    let mut owners: HashMap<String, &str> = HashMap::new();

    for plan in plans {
        for output in plan.stages.iter().filter_map(|s| s.output.as_deref()) {
            let key = output.to_lowercase();
            if sources.contains(&key) {
                return Err(EncodeError::consistency(format!(
                    "{} would overwrite a source file",
                    output
                )));
            }
            if let Some(owner) = owners.insert(key, &plan.source) {
                return Err(EncodeError::consistency(format!(
                    "{} is written for both {} and {}",
                    output, owner, plan.source
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::StageKind;
    use crate::planner::compile;
    use std::sync::Mutex;

    /// Serves canned probe output and records every call
    struct CannedProbe {
        outputs: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl CannedProbe {
        fn new(outputs: &[(&str, &str)]) -> Self {
            Self {
                outputs: outputs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProbePort for CannedProbe {
        fn probe(&self, file_path: &str) -> EncodeResult<String> {
            self.calls.lock().unwrap().push(file_path.to_string());
            self.outputs
                .get(file_path)
                .cloned()
                .ok_or_else(|| EncodeError::probe("no output"))
        }
    }

    const STEREO_AAC: &str = r#"{"streams": [
        {"index": 0, "codec_type": "video", "codec_name": "h264", "width": 1280, "height": 720},
        {"index": 1, "codec_type": "audio", "codec_name": "aac", "channels": 2,
         "tags": {"language": "eng"}, "disposition": {"default": 1}}
    ]}"#;

    fn request(audio: &str) -> JobRequest {
        JobRequest::builder("S:/Shows", "SHOW")
            .audio_profile(audio)
            .work_dir("R:/enc")
            .build()
            .unwrap()
    }

    #[test]
    fn test_probe_failure_degrades_single_file() {
        let probe = Arc::new(CannedProbe::new(&[("S:/a.mkv", STEREO_AAC)]));
        let interactor = BatchInteractor::new(probe.clone(), ProfileTable::builtin());
        let files = vec!["S:/a.mkv".to_string(), "S:/b.mkv".to_string()];

        let report = interactor.run_files(&request("default"), &files).unwrap();

        assert_eq!(report.plans.len(), 2);
        assert_eq!(report.degraded, 1);
        assert!(report.plans[0].warnings.is_empty());
        assert_eq!(report.plans[1].warnings[0].kind, WarningKind::ProbeDegraded);
        assert_eq!(*probe.calls.lock().unwrap(), files);
    }

    #[test]
    fn test_invalid_request_aborts_before_probing() {
        let probe = Arc::new(CannedProbe::new(&[("S:/a.mkv", STEREO_AAC)]));
        let interactor = BatchInteractor::new(probe.clone(), ProfileTable::builtin());

        let err = interactor
            .run_files(&request("flac-lossless"), &["S:/a.mkv".to_string()])
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(probe.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_probed_file_uses_smart_decisions() {
        let probe = Arc::new(CannedProbe::new(&[("S:/a.mkv", STEREO_AAC)]));
        let interactor = BatchInteractor::new(probe, ProfileTable::builtin());

        let plan = interactor.plan_file("S:/a.mkv", &request("default")).unwrap();
        assert_eq!(plan.decision.effective_audio_profile, "copy");
        assert_eq!(
            plan.stage(StageKind::AudioEncode).unwrap().output.as_deref(),
            Some("R:/enc/a.aac")
        );
    }

    fn stems(files: &[&str]) -> Vec<String> {
        output_stems(&files.iter().map(|f| f.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn test_unique_stems_are_kept() {
        assert_eq!(stems(&["S:/Shows/a.mkv", "S:/Shows/b.mkv"]), vec!["a", "b"]);
    }

    #[test]
    fn test_shared_stems_take_parent_directory() {
        assert_eq!(
            stems(&["S:/Shows/S1/Ep 01.mkv", "S:/Shows/S2/Ep 01.mkv", "S:/Shows/S2/Ep 02.mkv"]),
            vec!["S1_Ep 01", "S2_Ep 01", "Ep 02"]
        );
        assert_eq!(stems(&["S:/Shows/x.mkv", "S:/Shows/X.mp4"]), vec!["Shows_x", "Shows_X_2"]);
        assert_eq!(stems(&["S:/x.mkv", "S:/x.mp4"]), vec!["x", "x_2"]);
    }

    #[test]
    fn test_same_named_files_get_distinct_outputs() {
        let probe = Arc::new(CannedProbe::new(&[
            ("S:/Shows/S1/Ep 01.mkv", STEREO_AAC),
            ("S:/Shows/S2/Ep 01.mkv", STEREO_AAC),
        ]));
        let interactor = BatchInteractor::new(probe, ProfileTable::builtin());
        let files = vec![
            "S:/Shows/S1/Ep 01.mkv".to_string(),
            "S:/Shows/S2/Ep 01.mkv".to_string(),
            "S:/Shows/S2/Ep 01.mp4".to_string(),
        ];

        let report = interactor.run_files(&request("default"), &files).unwrap();

        let finals: Vec<&str> = report.plans.iter().map(|p| p.final_output.as_str()).collect();
        assert_eq!(
            finals,
            vec!["R:/enc/S1_Ep 01.mkv", "R:/enc/S2_Ep 01.mkv", "R:/enc/S2_Ep 01_2.mkv"]
        );
        assert!(report.plans[0].cleanup.iter().all(|p| !report.plans[1].cleanup.contains(p)));
        assert_eq!(report.degraded, 1);
    }

    #[test]
    fn test_batch_rejects_outputs_shared_between_plans() {
        let descriptor = normalize(STEREO_AAC).unwrap();
        let profiles = ProfileTable::builtin();
        let plans: Vec<Plan> = ["S:/Shows/S1/Ep 01.mkv", "S:/Shows/S2/Ep 01.mkv"]
            .iter()
            .map(|f| compile(f, &descriptor, &request("default"), &profiles).unwrap())
            .collect();

        let err = check_batch_outputs(&plans).unwrap_err();
        assert!(matches!(err, EncodeError::PlanConsistency { .. }));
        assert!(check_batch_outputs(&plans[..1]).is_ok());
    }

    #[test]
    fn test_batch_rejects_output_over_another_source() {
        let descriptor = normalize(STEREO_AAC).unwrap();
        let profiles = ProfileTable::builtin();
        let elsewhere = JobRequest::builder("S:/Shows", "SHOW")
            .work_dir("R:/other")
            .build()
            .unwrap();
        // The first plan writes R:/enc/a.mkv, which the second one reads.
        let plans = vec![
            compile("S:/Shows/a.mkv", &descriptor, &request("default"), &profiles).unwrap(),
            compile("R:/enc/a.mkv", &descriptor, &elsewhere, &profiles).unwrap(),
        ];
        assert!(check_batch_outputs(&plans).is_err());
    }
}
