//! Docker 后端抽象
//! 分析逻辑只依赖 `DockerBackend`，真实实现见 `cli`

pub mod cli;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

use crate::utils::Result;

pub use cli::CliBackend;

// ── 数据结构 ────────────────────────────────────────────────────────────────

/// One line of `docker images --format '{{json .}}'`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImageSummary {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Repository", alias = "RepositoryName")]
    pub repository: String,
    #[serde(rename = "Tag", alias = "TagName")]
    pub tag: String,
}

/// One line of `docker ps --format '{{json .}}'`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContainerSummary {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Names", alias = "Name")]
    pub names: String,
}

/// One line of `docker history --no-trunc --format '{{json .}}'`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoryEntry {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "CreatedBy")]
    pub created_by: String,
    #[serde(rename = "Size")]
    pub size: String,
}

// ── 后端接口 ────────────────────────────────────────────────────────────────

pub trait DockerBackend {
    fn list_images(&self) -> Result<Vec<ImageSummary>>;

    fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>>;

    /// Raw `docker inspect` object for a single image or container.
    fn inspect(&self, id: &str) -> Result<serde_json::Value>;

    fn history(&self, id: &str) -> Result<Vec<HistoryEntry>>;

    /// Run `docker build -t <tag> .` inside `dir`.
    fn build(&self, dir: &Path, tag: &str) -> Result<()>;
}

// ── 工具 ────────────────────────────────────────────────────────────────────

/// Parse newline-delimited JSON, dropping lines that fail to decode.
pub fn parse_json_lines<T: DeserializeOwned>(output: &str) -> Vec<T> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| match serde_json::from_str(l) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!("skipping undecodable line: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_lines_skip_blank_and_garbage() {
        let out = r#"{"ID":"abc","Repository":"nginx","Tag":"1.25","Size":"187MB"}

not json
{"ID":"def","RepositoryName":"redis","TagName":"7"}
"#;
        let images: Vec<ImageSummary> = parse_json_lines(out);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].repository, "nginx");
        assert_eq!(images[1].repository, "redis");
        assert_eq!(images[1].tag, "7");
        assert!(images[0].id == "abc" && images[1].id == "def");
    }

    #[test]
    fn container_names_alias() {
        let out = r#"{"ID":"1","Names":"web"}
{"ID":"2","Name":"db"}"#;
        let cs: Vec<ContainerSummary> = parse_json_lines(out);
        assert_eq!(cs[0].names, "web");
        assert_eq!(cs[1].names, "db");
    }
}
