//! 镜像规则

use super::descriptor::ImageDescriptor;
use super::rules::{format_bytes, parse_layer_size, Rule, Thresholds};
use crate::utils::{Recommendation, Severity};

const SOURCE_LABEL: &str = "org.opencontainers.image.source";

pub const IMAGE_RULES: &[Rule<ImageDescriptor>] = &[
    Rule { name: "image-size", severity: Severity::Info, check: check_size },
    Rule { name: "layer-count", severity: Severity::Info, check: check_layer_count },
    Rule { name: "root-user", severity: Severity::Warning, check: check_root_user },
    Rule { name: "healthcheck", severity: Severity::Suggestion, check: check_healthcheck },
    Rule { name: "port-labels", severity: Severity::Info, check: check_port_labels },
    Rule { name: "python-unbuffered", severity: Severity::Suggestion, check: check_python_unbuffered },
    Rule { name: "pip-cache", severity: Severity::Info, check: check_pip_cache },
    Rule { name: "large-layers", severity: Severity::Info, check: check_large_layers },
];

/// Evaluate every image rule in order. Always returns at least one entry.
pub fn analyze(image: &ImageDescriptor, thresholds: &Thresholds) -> Vec<Recommendation> {
    let subject = image.subject();
    let mut recs: Vec<Recommendation> = IMAGE_RULES
        .iter()
        .flat_map(|rule| {
            let found = (rule.check)(image, thresholds);
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
        recs.push(Recommendation::new(&subject, Severity::Ok, "No issues detected for this image."));
    }
    recs
}

fn check_size(img: &ImageDescriptor, t: &Thresholds) -> Vec<String> {
    if img.size_bytes <= t.max_image_bytes {
        return vec![];
    }
    vec![format!(
        "Image size exceeds {} ({}). Consider multi-stage builds, removing build tools, and pruning package caches.",
        format_bytes(t.max_image_bytes),
        format_bytes(img.size_bytes)
    )]
}

fn check_layer_count(img: &ImageDescriptor, t: &Thresholds) -> Vec<String> {
    if img.layers.len() <= t.max_layers {
        return vec![];
    }
    vec![format!(
        "Image has {} layers; consolidating RUN instructions or leveraging multi-stage builds can reduce layer count and size.",
        img.layers.len()
    )]
}

fn check_root_user(img: &ImageDescriptor, _: &Thresholds) -> Vec<String> {
    if !img.config.runs_as_root() {
        return vec![];
    }
    vec!["Container runs as root by default. Define a non-root user for improved security.".to_string()]
}

fn check_healthcheck(img: &ImageDescriptor, _: &Thresholds) -> Vec<String> {
    if img.config.has_healthcheck {
        return vec![];
    }
    vec!["No HEALTHCHECK configured. Add one to detect unhealthy containers at runtime.".to_string()]
}

fn check_port_labels(img: &ImageDescriptor, _: &Thresholds) -> Vec<String> {
    let has_source = img.config.labels.get(SOURCE_LABEL).is_some_and(|v| !v.is_empty());
    if img.config.exposed_ports.is_empty() || has_source {
        return vec![];
    }
    vec![format!(
        "Expose ports with clear metadata (labels like {}) to aid SBOM tracking.",
        SOURCE_LABEL
    )]
}

fn check_python_unbuffered(img: &ImageDescriptor, _: &Thresholds) -> Vec<String> {
    let runs_python = img.config.cmd.iter().any(|c| c.to_lowercase().contains("python"));
    if !runs_python || img.config.env_var("PYTHONUNBUFFERED").is_some() {
        return vec![];
    }
    vec!["Set PYTHONUNBUFFERED=1 to improve logging responsiveness for Python applications.".to_string()]
}

fn check_pip_cache(img: &ImageDescriptor, _: &Thresholds) -> Vec<String> {
    if matches!(img.config.env_var("PIP_NO_CACHE_DIR"), Some("1" | "true" | "True")) {
        return vec![];
    }
    vec!["Enable PIP_NO_CACHE_DIR=1 to avoid persisting pip caches inside the image.".to_string()]
}

fn check_large_layers(img: &ImageDescriptor, t: &Thresholds) -> Vec<String> {
    img.history
        .iter()
        .filter(|layer| match parse_layer_size(&layer.size) {
            Some((value, unit)) => {
                unit.starts_with("GB") || (unit.starts_with("MB") && value > t.large_layer_mb)
            }
            None => false,
        })
        .map(|layer| {
            let created_by = if layer.created_by.is_empty() { "<unknown>" } else { &layer.created_by };
            format!(
                "Layer created by '{}' is large ({}). Break the command into smaller steps or clean temporary artifacts to shrink the layer.",
                created_by, layer.size
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::descriptor::ConfigBlock;
    use crate::docker::HistoryEntry;

    /// An image that trips none of the rules.
    fn clean_image() -> ImageDescriptor {
        ImageDescriptor {
            id: "sha256:abc".into(),
            repository: "web".into(),
            tag: "1.0".into(),
            size_bytes: 50 * 1024 * 1024,
            layers: vec!["sha256:l1".into(), "sha256:l2".into()],
            config: ConfigBlock {
                user: Some("app".into()),
                has_healthcheck: true,
                env: vec!["PIP_NO_CACHE_DIR=1".into()],
                cmd: vec!["./server".into()],
                ..Default::default()
            },
            history: vec![HistoryEntry { created_by: "COPY . /app".into(), size: "12MB".into(), ..Default::default() }],
        }
    }

    fn severities(recs: &[Recommendation]) -> Vec<Severity> {
        recs.iter().map(|r| r.severity).collect()
    }

    #[test]
    fn clean_image_is_ok() {
        let recs = analyze(&clean_image(), &Thresholds::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].severity, Severity::Ok);
        assert_eq!(recs[0].subject, "image web:1.0 (sha256:abc)");
    }

    #[test]
    fn big_rootless_unchecked_image_in_rule_order() {
        let mut img = clean_image();
        img.size_bytes = 600 * 1024 * 1024;
        img.config.user = None;
        img.config.has_healthcheck = false;

        let recs = analyze(&img, &Thresholds::default());
        assert_eq!(severities(&recs), vec![Severity::Info, Severity::Warning, Severity::Suggestion]);
        assert!(recs[0].message.contains("600.0 MB"));
        assert!(recs[1].message.contains("root"));
        assert!(recs[2].message.contains("HEALTHCHECK"));
    }

    #[test]
    fn explicit_root_user_warns() {
        let mut img = clean_image();
        img.config.user = Some("root".into());
        let recs = analyze(&img, &Thresholds::default());
        assert_eq!(severities(&recs), vec![Severity::Warning]);
    }

    #[test]
    fn too_many_layers() {
        let mut img = clean_image();
        img.layers = (0..21).map(|i| format!("sha256:{}", i)).collect();
        let recs = analyze(&img, &Thresholds::default());
        assert_eq!(recs.len(), 1);
        assert!(recs[0].message.starts_with("Image has 21 layers"));

        img.layers.truncate(20);
        assert_eq!(analyze(&img, &Thresholds::default())[0].severity, Severity::Ok);
    }

    #[test]
    fn exposed_ports_need_source_label() {
        let mut img = clean_image();
        img.config.exposed_ports = vec!["8080/tcp".into()];
        let recs = analyze(&img, &Thresholds::default());
        assert_eq!(recs.len(), 1);
        assert!(recs[0].message.contains(SOURCE_LABEL));

        img.config.labels.insert(SOURCE_LABEL.into(), "https://example.org/web".into());
        assert_eq!(analyze(&img, &Thresholds::default())[0].severity, Severity::Ok);
    }

    #[test]
    fn python_command_without_unbuffered() {
        let mut img = clean_image();
        img.config.cmd = vec!["/usr/bin/Python3".into(), "app.py".into()];
        let recs = analyze(&img, &Thresholds::default());
        assert_eq!(severities(&recs), vec![Severity::Suggestion]);
        assert!(recs[0].message.contains("PYTHONUNBUFFERED"));

        img.config.env.push("PYTHONUNBUFFERED=1".into());
        assert_eq!(analyze(&img, &Thresholds::default())[0].severity, Severity::Ok);
    }

    #[test]
    fn pip_cache_requires_affirmative_value() {
        let mut img = clean_image();
        img.config.env = vec!["PIP_NO_CACHE_DIR=0".into()];
        let recs = analyze(&img, &Thresholds::default());
        assert!(recs[0].message.contains("PIP_NO_CACHE_DIR"));

        img.config.env = vec!["PIP_NO_CACHE_DIR=True".into()];
        assert_eq!(analyze(&img, &Thresholds::default())[0].severity, Severity::Ok);
    }

    #[test]
    fn large_history_layers_cite_instruction() {
        let mut img = clean_image();
        img.history = vec![
            HistoryEntry { created_by: "RUN apt-get install -y gcc".into(), size: "350MB".into(), ..Default::default() },
            HistoryEntry { created_by: "RUN make".into(), size: "1.1 GB".into(), ..Default::default() },
            HistoryEntry { created_by: "COPY . .".into(), size: "199MB".into(), ..Default::default() },
            HistoryEntry { created_by: "".into(), size: "0B".into(), ..Default::default() },
        ];
        let recs = analyze(&img, &Thresholds::default());
        assert_eq!(recs.len(), 2);
        assert!(recs[0].message.contains("'RUN apt-get install -y gcc'"));
        assert!(recs[0].message.contains("(350MB)"));
        assert!(recs[1].message.contains("'RUN make'"));
    }

    #[test]
    fn custom_thresholds() {
        let mut img = clean_image();
        img.size_bytes = 2 * 1024 * 1024;
        let t = Thresholds { max_image_bytes: 1024 * 1024, ..Thresholds::default() };
        let recs = analyze(&img, &t);
        assert_eq!(recs[0].severity, Severity::Info);
        assert!(recs[0].message.contains("1.0 MB"));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let mut img = clean_image();
        img.config.user = None;
        img.config.exposed_ports = vec!["80/tcp".into()];
        let t = Thresholds::default();
        assert_eq!(analyze(&img, &t), analyze(&img, &t));
    }
}
