//! inspect JSON → 描述结构
//! 缺失或类型不符的字段一律按"未设置"处理，不报错

use serde_json::Value;
use std::collections::BTreeMap;

use crate::docker::HistoryEntry;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigBlock {
    pub user: Option<String>,
    pub has_healthcheck: bool,
    pub exposed_ports: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub env: Vec<String>,
    pub cmd: Vec<String>,
}

impl ConfigBlock {
    /// Value of `KEY` in the `KEY=VALUE` env list; entries without `=` are ignored.
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .filter_map(|e| e.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub fn runs_as_root(&self) -> bool {
        matches!(self.user.as_deref(), None | Some("") | Some("root"))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageDescriptor {
    pub id: String,
    pub repository: String,
    pub tag: String,
    pub size_bytes: u64,
    pub layers: Vec<String>,
    pub config: ConfigBlock,
    pub history: Vec<HistoryEntry>,
}

impl ImageDescriptor {
    pub fn from_inspect(
        id: &str,
        repository: &str,
        tag: &str,
        inspect: &Value,
        history: Vec<HistoryEntry>,
    ) -> Self {
        let layers = inspect["RootFS"]["Layers"]
            .as_array()
            .map(|a| a.iter().filter_map(|v| v.as_str()).map(String::from).collect())
            .unwrap_or_default();

        Self {
            id: id.to_string(),
            repository: repository.to_string(),
            tag: tag.to_string(),
            size_bytes: inspect["Size"].as_u64().unwrap_or(0),
            layers,
            config: parse_config(&inspect["Config"]),
            history,
        }
    }

    pub fn subject(&self) -> String {
        image_subject(&self.id, &self.repository, &self.tag)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostConfigBlock {
    pub restart_policy: Option<String>,
    pub privileged: bool,
    pub memory_limit: u64,
    pub log_driver: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerDescriptor {
    pub id: String,
    pub name: String,
    pub running: bool,
    pub health: Option<String>,
    pub config: ConfigBlock,
    pub host_config: HostConfigBlock,
    /// container port → host bindings; `None` means published without a host binding
    pub ports: BTreeMap<String, Option<Vec<String>>>,
}

impl ContainerDescriptor {
    pub fn from_inspect(id: &str, name: &str, inspect: &Value) -> Self {
        let state = &inspect["State"];
        let hc = &inspect["HostConfig"];

        let host_config = HostConfigBlock {
            restart_policy: opt_str(&hc["RestartPolicy"]["Name"]),
            privileged: hc["Privileged"].as_bool().unwrap_or(false),
            memory_limit: hc["Memory"].as_u64().unwrap_or(0),
            log_driver: opt_str(&hc["LogConfig"]["Type"]),
        };

        Self {
            id: id.to_string(),
            name: name.to_string(),
            running: state["Running"].as_bool().unwrap_or(false),
            health: opt_str(&state["Health"]["Status"]),
            config: parse_config(&inspect["Config"]),
            host_config,
            ports: parse_published_ports(&inspect["NetworkSettings"]["Ports"]),
        }
    }

    pub fn subject(&self) -> String {
        container_subject(&self.id, &self.name)
    }
}

// ── subject 文本 ────────────────────────────────────────────────────────────

pub fn image_subject(id: &str, repository: &str, tag: &str) -> String {
    format!("image {}:{} ({})", or_none(repository, "<none>"), or_none(tag, "<none>"), id)
}

pub fn container_subject(id: &str, name: &str) -> String {
    format!("container {} ({})", or_none(name, "<unnamed>"), id)
}

fn or_none<'a>(s: &'a str, fallback: &'a str) -> &'a str {
    if s.is_empty() { fallback } else { s }
}

// ── 解析 ────────────────────────────────────────────────────────────────────

fn parse_config(c: &Value) -> ConfigBlock {
    let labels = c["Labels"]
        .as_object()
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let exposed_ports = c["ExposedPorts"]
        .as_object()
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();

    // Healthcheck 为 {"Test":["NONE"]} 时表示显式关闭
    let has_healthcheck = match &c["Healthcheck"] {
        Value::Object(m) if !m.is_empty() => {
            let disabled = m
                .get("Test")
                .and_then(|t| t.as_array())
                .and_then(|t| t.first())
                .and_then(|v| v.as_str())
                == Some("NONE");
            !disabled
        }
        _ => false,
    };

    ConfigBlock {
        user: opt_str(&c["User"]),
        has_healthcheck,
        exposed_ports,
        labels,
        env: str_list(&c["Env"]),
        cmd: str_list(&c["Cmd"]),
    }
}

fn parse_published_ports(ports: &Value) -> BTreeMap<String, Option<Vec<String>>> {
    let mut result = BTreeMap::new();
    if let Some(map) = ports.as_object() {
        for (container_port, bindings) in map {
            let host = bindings.as_array().map(|arr| {
                arr.iter()
                    .map(|b| {
                        format!(
                            "{}:{}",
                            b["HostIp"].as_str().unwrap_or("0.0.0.0"),
                            b["HostPort"].as_str().unwrap_or("")
                        )
                    })
                    .collect()
            });
            result.insert(container_port.clone(), host);
        }
    }
    result
}

fn opt_str(v: &Value) -> Option<String> {
    v.as_str().map(String::from)
}

fn str_list(v: &Value) -> Vec<String> {
    v.as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str()).map(String::from).collect())
        .unwrap_or_default()
}
