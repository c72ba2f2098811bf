//! 容器规则

use super::descriptor::ContainerDescriptor;
use super::rules::{Rule, Thresholds};
use crate::utils::{Recommendation, Severity};

pub const CONTAINER_RULES: &[Rule<ContainerDescriptor>] = &[
    Rule { name: "not-running", severity: Severity::Warning, check: check_running },
    Rule { name: "unhealthy", severity: Severity::Warning, check: check_health },
    Rule { name: "root-user", severity: Severity::Warning, check: check_root_user },
    Rule { name: "restart-policy", severity: Severity::Suggestion, check: check_restart_policy },
    Rule { name: "privileged", severity: Severity::Warning, check: check_privileged },
    Rule { name: "memory-limit", severity: Severity::Info, check: check_memory_limit },
    Rule { name: "log-driver", severity: Severity::Suggestion, check: check_log_driver },
    Rule { name: "unbound-ports", severity: Severity::Info, check: check_unbound_ports },
];

/// Evaluate every container rule in order. Always returns at least one entry.
pub fn analyze(container: &ContainerDescriptor, thresholds: &Thresholds) -> Vec<Recommendation> {
    let subject = container.subject();
    let mut recs: Vec<Recommendation> = CONTAINER_RULES
        .iter()
        .flat_map(|rule| {
            let found = (rule.check)(container, thresholds);
            if !found.is_empty() {
                tracing::debug!(rule = rule.name, subject = %subject, "rule fired");
            }
            found
                .into_iter()
                .map(|msg| Recommendation::new(&subject, rule.severity, msg))
                .collect::<Vec<_>>()
        })
        .collect();

    if recs.is_empty() {
        recs.push(Recommendation::new(
            &subject,
            Severity::Ok,
            "No runtime issues detected for this container.",
        ));
    }
    recs
}

fn check_running(c: &ContainerDescriptor, _: &Thresholds) -> Vec<String> {
    if c.running {
        return vec![];
    }
    vec!["Container is not running. Review recent exit codes for stability issues.".to_string()]
}

fn check_health(c: &ContainerDescriptor, _: &Thresholds) -> Vec<String> {
    // 只对运行中的容器判断健康状态
    match c.health.as_deref() {
        Some(status) if c.running && status != "healthy" => vec![format!(
            "Container health status is {}. Investigate failing health checks.",
            status
        )],
        _ => vec![],
    }
}

fn check_root_user(c: &ContainerDescriptor, _: &Thresholds) -> Vec<String> {
    if !c.config.runs_as_root() {
        return vec![];
    }
    vec!["Container is running as root. Use a non-root user or user namespace remapping for better security.".to_string()]
}

fn check_restart_policy(c: &ContainerDescriptor, _: &Thresholds) -> Vec<String> {
    match c.host_config.restart_policy.as_deref() {
        None | Some("") | Some("no") => vec![
            "No restart policy configured. Consider using --restart unless-stopped for resilient workloads.".to_string(),
        ],
        _ => vec![],
    }
}

fn check_privileged(c: &ContainerDescriptor, _: &Thresholds) -> Vec<String> {
    if !c.host_config.privileged {
        return vec![];
    }
    vec!["Container is running in privileged mode. Drop to least privileges whenever possible.".to_string()]
}

fn check_memory_limit(c: &ContainerDescriptor, _: &Thresholds) -> Vec<String> {
    if c.host_config.memory_limit > 0 {
        return vec![];
    }
    vec!["No memory limit set. Configure --memory to avoid node contention and improve stability.".to_string()]
}

fn check_log_driver(c: &ContainerDescriptor, _: &Thresholds) -> Vec<String> {
    match c.host_config.log_driver.as_deref() {
        None | Some("") | Some("json-file") => vec![
            "Default logging driver json-file can grow unbounded. Configure max-size/max-file or switch to centralized logging.".to_string(),
        ],
        _ => vec![],
    }
}

fn check_unbound_ports(c: &ContainerDescriptor, _: &Thresholds) -> Vec<String> {
    if !c.ports.values().any(Option::is_none) {
        return vec![];
    }
    vec!["Container exposes ports without host bindings. Ensure proper network policies are enforced.".to_string()]
}
