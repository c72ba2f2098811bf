//! 遍历目录树，对每个含 Dockerfile 的目录执行 docker build

use std::fs;
use std::path::{Path, PathBuf};

use crate::docker::DockerBackend;
use crate::utils::{AdviseError, Result};

#[derive(Debug, Default)]
pub struct BuildSummary {
    pub built: Vec<(PathBuf, String)>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Directories below `root` (inclusive) that hold a file named exactly `Dockerfile`.
pub fn find_build_contexts(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    collect_contexts(root, &mut found);
    found.sort();
    found
}

fn collect_contexts(dir: &Path, found: &mut Vec<PathBuf>) {
    if dir.join("Dockerfile").is_file() {
        found.push(dir.to_path_buf());
    }
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            collect_contexts(&entry.path(), found);
        }
    }
}

/// Image tag for a build context: its base name, lower-cased, spaces as `_`.
pub fn tag_for(dir: &Path) -> String {
    let base = dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .or_else(|| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "image".to_string());
    base.to_lowercase().replace(' ', "_")
}

pub fn build_all<B: DockerBackend + ?Sized>(backend: &B, root: &Path) -> Result<BuildSummary> {
    if !root.is_dir() {
        return Err(AdviseError::System(format!("not a directory: {}", root.display())));
    }

    let mut summary = BuildSummary::default();
    for dir in find_build_contexts(root) {
        let tag = tag_for(&dir);
        eprintln!("Building Docker image for: {} (tag {})", dir.display(), tag);
        match backend.build(&dir, &tag) {
            Ok(()) => summary.built.push((dir, tag)),
            // docker 不可用时后续构建也不会成功
            Err(e) if e.is_unavailable() => return Err(e),
            Err(e) => {
                tracing::warn!("build failed in {}: {}", dir.display(), e);
                summary.failed.push((dir, tag));
            }
        }
    }
    Ok(summary)
}
