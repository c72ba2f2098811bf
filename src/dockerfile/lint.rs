//! Dockerfile 静态规则

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use super::parser::Instruction;
use crate::utils::Severity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// `None` for findings about the file as a whole
    pub instruction: Option<usize>,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn at(index: usize, severity: Severity, message: &str) -> Self {
        Self { instruction: Some(index), severity, message: message.to_string() }
    }

    fn general(severity: Severity, message: &str) -> Self {
        Self { instruction: None, severity, message: message.to_string() }
    }

    pub fn location(&self) -> String {
        match self.instruction {
            Some(i) => format!("instruction {}", i),
            None => "(general)".to_string(),
        }
    }
}

/// More RUN instructions than this (with apt-get) suggests multi-stage builds.
const MAX_PLAIN_RUNS: usize = 3;

fn apt_clean_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"apt-get\s+clean|rm\s+-rf\s+/var/lib/apt/lists").expect("valid regex"))
}

fn pipe_to_shell_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(curl|wget).*\|.*(sh|bash)").expect("valid regex"))
}

fn archive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.tar(\.gz|\.bz2|\.xz)?").expect("valid regex"))
}

pub fn lint(instructions: &[Instruction]) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut user_specified = false;
    let mut runs: Vec<&str> = Vec::new();

    for ins in instructions {
        let value = ins.value.as_str();
        match ins.keyword.as_str() {
            "FROM" => {
                if !value.contains(':') || value.trim().ends_with(":latest") {
                    findings.push(Finding::at(
                        ins.index,
                        Severity::Warning,
                        "Specify a fixed version tag or digest for the base image for reproducibility and security.",
                    ));
                }
            }
            "RUN" => {
                runs.push(value);
                check_run(ins.index, value, &mut findings);
            }
            "ADD" => {
                if !archive_re().is_match(value) {
                    findings.push(Finding::at(
                        ins.index,
                        Severity::Info,
                        "Use COPY instead of ADD when not extracting archives to improve caching behaviour.",
                    ));
                }
            }
            "USER" => user_specified = true,
            _ => {}
        }
    }

    if runs.len() > MAX_PLAIN_RUNS && runs.iter().any(|r| r.contains("apt-get")) {
        findings.push(Finding::general(
            Severity::Suggestion,
            "Consider using multi-stage builds to separate build-time dependencies from the final runtime image.",
        ));
    }
    if !user_specified {
        findings.push(Finding::general(
            Severity::Warning,
            "No USER directive found. Running as root can be risky; consider adding a non-root user.",
        ));
    }
    if !instructions.iter().any(|i| i.keyword == "HEALTHCHECK") {
        findings.push(Finding::general(
            Severity::Suggestion,
            "Consider adding a HEALTHCHECK instruction for improved reliability.",
        ));
    }

    findings
}

fn check_run(index: usize, value: &str, findings: &mut Vec<Finding>) {
    if value.contains("apt-get") || value.contains("apt ") {
        if !value.contains("--no-install-recommends") {
            findings.push(Finding::at(
                index,
                Severity::Info,
                "Use --no-install-recommends with apt-get to avoid unnecessary packages.",
            ));
        }
        if !apt_clean_re().is_match(value) {
            findings.push(Finding::at(
                index,
                Severity::Info,
                "Clean apt caches (e.g., apt-get clean && rm -rf /var/lib/apt/lists/*) to reduce image size.",
            ));
        }
        if value.contains("apt-get update") && !value.contains("apt-get install") {
            findings.push(Finding::at(
                index,
                Severity::Info,
                "Run apt-get update and install in the same RUN layer to improve caching and size.",
            ));
        }
    }
    if value.contains("pip install") && !value.contains("--no-cache-dir") {
        findings.push(Finding::at(
            index,
            Severity::Info,
            "Use --no-cache-dir with pip install to reduce image size.",
        ));
    }
    if pipe_to_shell_re().is_match(value) {
        findings.push(Finding::at(
            index,
            Severity::Warning,
            "Avoid piping curl/wget directly to shell; download and verify scripts before execution.",
        ));
    }
    if !value.contains("&&") {
        findings.push(Finding::at(
            index,
            Severity::Info,
            "Combine multiple shell commands with '&&' in a single RUN to reduce layers.",
        ));
    }
}
