//! 通过 docker CLI 获取数据
//! 来源：docker images / docker ps / docker inspect / docker history / docker build

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::{parse_json_lines, ContainerSummary, DockerBackend, HistoryEntry, ImageSummary};
use crate::utils::{AdviseError, Result};

pub struct CliBackend {
    program: String,
}

impl CliBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    fn ensure_available(&self) -> Result<()> {
        if resolve_program(&self.program).is_none() {
            return Err(AdviseError::Unavailable(format!(
                "Docker CLI not found in PATH ({}). Install Docker or ensure it is accessible.",
                self.program
            )));
        }
        Ok(())
    }

    fn spawn_error(&self, e: std::io::Error) -> AdviseError {
        if e.kind() == std::io::ErrorKind::NotFound {
            AdviseError::Unavailable(format!("Docker CLI could not be executed: {}", e))
        } else {
            AdviseError::Io(e)
        }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        self.ensure_available()?;
        tracing::debug!("running {} {}", self.program, args.join(" "));

        let out: Output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !out.status.success() {
            return Err(AdviseError::Command(format!(
                "docker {}\n{}",
                args.join(" "),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

impl Default for CliBackend {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerBackend for CliBackend {
    fn list_images(&self) -> Result<Vec<ImageSummary>> {
        let out = self.run(&["images", "--digests", "--format", "{{json .}}"])?;
        Ok(parse_json_lines(&out))
    }

    fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        let out = if all {
            self.run(&["ps", "-a", "--format", "{{json .}}"])?
        } else {
            self.run(&["ps", "--format", "{{json .}}"])?
        };
        Ok(parse_json_lines(&out))
    }

    fn inspect(&self, id: &str) -> Result<serde_json::Value> {
        let out = self.run(&["inspect", id])?;
        first_inspect_object(&out, id)
    }

    fn history(&self, id: &str) -> Result<Vec<HistoryEntry>> {
        let out = self.run(&["history", id, "--no-trunc", "--format", "{{json .}}"])?;
        Ok(parse_json_lines(&out))
    }

    fn build(&self, dir: &Path, tag: &str) -> Result<()> {
        self.ensure_available()?;
        tracing::debug!("running {} build -t {} . in {}", self.program, tag, dir.display());

        // 构建输出直接透传到终端
        let status = Command::new(&self.program)
            .args(["build", "-t", tag, "."])
            .current_dir(dir)
            .status()
            .map_err(|e| self.spawn_error(e))?;

        if !status.success() {
            return Err(AdviseError::Command(format!(
                "docker build -t {} . in {} exited with {}",
                tag,
                dir.display(),
                status
            )));
        }
        Ok(())
    }
}

/// `docker inspect` always returns an array; take its first element.
fn first_inspect_object(output: &str, id: &str) -> Result<serde_json::Value> {
    let arr: serde_json::Value = serde_json::from_str(output)
        .map_err(|e| AdviseError::Parse(format!("Failed to parse docker inspect output for {}: {}", id, e)))?;

    arr.as_array()
        .and_then(|a| a.first())
        .cloned()
        .ok_or_else(|| AdviseError::Parse(format!("docker inspect returned no data for {}", id)))
}

/// Resolve a program the way a shell would: paths are checked directly,
/// bare names are searched in `PATH`.
fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}
