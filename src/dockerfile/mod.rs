pub mod lint;
pub mod parser;

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::analyze::output::Format;
use crate::utils::{AdviseError, Result, Severity};
use lint::Finding;

/// Lint a single Dockerfile. An unreadable file yields one `error` finding.
pub fn analyse_file(path: &Path) -> Vec<Finding> {
    match fs::read_to_string(path) {
        Ok(contents) => lint::lint(&parser::parse(&contents)),
        Err(e) => {
            tracing::warn!("cannot read {}: {}", path.display(), e);
            let message = if e.kind() == std::io::ErrorKind::NotFound {
                format!("Dockerfile not found: {}", path.display())
            } else {
                format!("Cannot read {}: {}", path.display(), e)
            };
            vec![Finding { instruction: None, severity: Severity::Error, message }]
        }
    }
}

/// One `--format json` line of lint output.
#[derive(Serialize)]
struct LintRow<'a> {
    path: String,
    #[serde(flatten)]
    finding: &'a Finding,
}

/// `Dockerfile` and `Dockerfile.*` (any case) below `root`, sorted.
pub fn find_dockerfiles(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(root, &mut found);
    found.sort();
    found
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!("skipping {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        // 不跟随符号链接，避免目录环
        let Ok(file_type) = entry.file_type() else { continue };
        if file_type.is_dir() {
            walk(&path, found);
        } else if file_type.is_file() && is_dockerfile_name(&entry.file_name().to_string_lossy()) {
            found.push(path);
        }
    }
}

fn is_dockerfile_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower == "dockerfile" || lower.starts_with("dockerfile.")
}

/// `lint` 子命令入口
pub fn run_lint<W: Write>(target: &Path, format: Format, out: &mut W) -> Result<()> {
    let files = if target.is_dir() {
        find_dockerfiles(target)
    } else if target.exists() {
        vec![target.to_path_buf()]
    } else {
        return Err(AdviseError::System(format!("path does not exist: {}", target.display())));
    };

    if files.is_empty() && format == Format::Text {
        writeln!(out, "No Dockerfiles found under {}", target.display())?;
    }

    for file in &files {
        let findings = analyse_file(file);
        match format {
            Format::Text => {
                writeln!(out, "Analyzing {}", file.display())?;
                for f in &findings {
                    writeln!(out, "  {}: {} - {}", f.severity, f.location(), f.message)?;
                }
            }
            Format::Json => {
                for finding in &findings {
                    let row = LintRow { path: file.display().to_string(), finding };
                    let line = serde_json::to_string(&row)
                        .map_err(|e| AdviseError::System(format!("JSON serialize: {}", e)))?;
                    writeln!(out, "{}", line)?;
                }
            }
        }
    }

    Ok(())
}
