// Filesystem scan adapter - Resolves a target path into the files to encode

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{EncodeError, EncodeResult};
use crate::utils::path;

/// Container extensions picked up from directories
const VIDEO_EXTENSIONS: [&str; 2] = ["mkv", "mp4"];

fn is_video_file(file: &str) -> bool {
    path::extension(file)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Files to encode under `target`, as canonical forward-slash paths.
///
/// A file target is returned as-is whatever its extension. A directory yields
/// its `mkv`/`mp4` files sorted by path, descending into subdirectories only
/// when `recursive` is set.
pub fn scan_targets(target: &str, recursive: bool) -> EncodeResult<Vec<String>> {
    let target = path::from_msys(target.trim());
    let root = Path::new(&target);

    if root.is_file() {
        debug!("Single file target {}", target);
        return Ok(vec![target]);
    }
    if !root.is_dir() {
        return Err(EncodeError::Scan {
            message: format!("path not found: {}", target),
        });
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file = path::canonical(&entry.path().to_string_lossy());
        if is_video_file(&file) {
            files.push(file);
        }
    }

    if files.is_empty() {
        return Err(EncodeError::Scan {
            message: format!("no mkv or mp4 files in {}", target),
        });
    }

    files.sort();
    info!("Found {} files in {}", files.len(), target);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        if let Some(parent) = dir.join(name).parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(dir.join(name), b"").unwrap();
    }

    fn names(files: &[String]) -> Vec<&str> {
        files.iter().map(|f| path::file_name(f)).collect()
    }

    #[test]
    fn test_directory_scan_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.MKV");
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "sub/c.mkv");

        let root = dir.path().to_string_lossy().to_string();
        let flat = scan_targets(&root, false).unwrap();
        assert_eq!(names(&flat), vec!["a.mp4", "b.MKV"]);
        assert!(flat.iter().all(|f| !f.contains('\\')));

        let deep = scan_targets(&root, true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.iter().any(|f| f.ends_with("sub/c.mkv")));
    }

    #[test]
    fn test_single_file_target() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "movie.avi");
        let file = dir.path().join("movie.avi").to_string_lossy().to_string();
        assert_eq!(scan_targets(&file, false).unwrap(), vec![path::canonical(&file)]);
    }

    #[test]
    fn test_missing_and_empty_targets_fail() {
        assert!(matches!(
            scan_targets("/definitely/not/here", false),
            Err(EncodeError::Scan { .. })
        ));

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "readme.md");
        let root = dir.path().to_string_lossy().to_string();
        assert!(matches!(scan_targets(&root, true), Err(EncodeError::Scan { .. })));
    }
}
