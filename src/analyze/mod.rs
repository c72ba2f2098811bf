pub mod container;
pub mod descriptor;
pub mod image;
pub mod output;
pub mod rules;
pub mod watch;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::docker::{ContainerSummary, DockerBackend, ImageSummary};
use crate::utils::{AdviseError, Recommendation, Result, Severity};
use descriptor::{container_subject, image_subject, ContainerDescriptor, ImageDescriptor};
use output::Renderer;
use rules::Thresholds;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzeOptions {
    pub images: bool,
    pub containers: bool,
    pub all_containers: bool,
}

impl AnalyzeOptions {
    /// `--all-containers` implies `--containers`; no selection means both.
    pub fn normalized(mut self) -> Self {
        if self.all_containers {
            self.containers = true;
        }
        if !self.images && !self.containers {
            self.images = true;
            self.containers = true;
        }
        self
    }
}

/// One analysis pass. A listing failure aborts the pass and is returned;
/// per-entity failures become `error` recommendations.
pub fn analyze_once<B, W>(
    backend: &B,
    opts: &AnalyzeOptions,
    thresholds: &Thresholds,
    out: &mut Renderer<W>,
) -> Result<()>
where
    B: DockerBackend + ?Sized,
    W: Write,
{
    analyze_until_stopped(backend, opts, thresholds, &AtomicBool::new(false), out)
}

/// Like [`analyze_once`], but checks `stop` before and after each entity.
/// Results fetched after the flag is set are dropped: Ctrl+C also kills the
/// in-flight docker child, so they would only report that.
pub fn analyze_until_stopped<B, W>(
    backend: &B,
    opts: &AnalyzeOptions,
    thresholds: &Thresholds,
    stop: &AtomicBool,
    out: &mut Renderer<W>,
) -> Result<()>
where
    B: DockerBackend + ?Sized,
    W: Write,
{
    let stopped = || stop.load(Ordering::SeqCst);

    if opts.images && !stopped() {
        let images = backend.list_images()?;
        tracing::debug!("found {} images", images.len());
        for img in &images {
            if stopped() {
                return Ok(());
            }
            let recs = analyze_image(backend, img, thresholds);
            if stopped() {
                return Ok(());
            }
            out.emit(&recs)?;
        }
    }

    if opts.containers && !stopped() {
        let containers = backend.list_containers(opts.all_containers)?;
        tracing::debug!("found {} containers", containers.len());
        if containers.is_empty() {
            out.notice("No containers found.")?;
        }
        for c in &containers {
            if stopped() {
                return Ok(());
            }
            let recs = analyze_container(backend, c, thresholds);
            if stopped() {
                return Ok(());
            }
            out.emit(&recs)?;
        }
    }

    Ok(())
}

pub fn analyze_image<B>(backend: &B, summary: &ImageSummary, thresholds: &Thresholds) -> Vec<Recommendation>
where
    B: DockerBackend + ?Sized,
{
    let subject = image_subject(&summary.id, &summary.repository, &summary.tag);

    let fetched = backend
        .inspect(&summary.id)
        .and_then(|inspect| backend.history(&summary.id).map(|h| (inspect, h)));

    match fetched {
        Ok((inspect, history)) => {
            let desc = ImageDescriptor::from_inspect(
                &summary.id,
                &summary.repository,
                &summary.tag,
                &inspect,
                history,
            );
            image::analyze(&desc, thresholds)
        }
        Err(e) => {
            tracing::debug!("skipping checks for {}: {}", subject, e);
            vec![Recommendation::new(&subject, Severity::Error, one_line(&e))]
        }
    }
}

pub fn analyze_container<B>(
    backend: &B,
    summary: &ContainerSummary,
    thresholds: &Thresholds,
) -> Vec<Recommendation>
where
    B: DockerBackend + ?Sized,
{
    let subject = container_subject(&summary.id, &summary.names);

    match backend.inspect(&summary.id) {
        Ok(inspect) => {
            let desc = ContainerDescriptor::from_inspect(&summary.id, &summary.names, &inspect);
            container::analyze(&desc, thresholds)
        }
        Err(e) => {
            tracing::debug!("skipping checks for {}: {}", subject, e);
            vec![Recommendation::new(&subject, Severity::Error, one_line(&e))]
        }
    }
}

/// docker stderr is multi-line; keep each recommendation on one line.
fn one_line(e: &AdviseError) -> String {
    e.to_string()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(": ")
}


#[cfg(test)]
mod tests {
    use super::output::Format;
    use super::testing::FakeBackend;
    use super::*;
    use serde_json::json;

    fn image(id: &str) -> ImageSummary {
        ImageSummary { id: id.into(), repository: "web".into(), tag: "1.0".into() }
    }

    fn container(id: &str, name: &str) -> ContainerSummary {
        ContainerSummary { id: id.into(), names: name.into() }
    }

    fn clean_image_inspect() -> serde_json::Value {
        json!({
            "Size": 1024,
            "RootFS": { "Layers": ["sha256:a"] },
            "Config": {
                "User": "app",
                "Healthcheck": { "Test": ["CMD", "true"] },
                "Env": ["PIP_NO_CACHE_DIR=1"]
            }
        })
    }

    fn run(backend: &FakeBackend, opts: AnalyzeOptions) -> (Result<()>, String) {
        let mut r = Renderer::new(Format::Text, Vec::new());
        let res = analyze_once(backend, &opts.normalized(), &Thresholds::default(), &mut r);
        (res, String::from_utf8(r.into_inner()).unwrap())
    }

    #[test]
    fn normalization() {
        let o = AnalyzeOptions::default().normalized();
        assert!(o.images && o.containers && !o.all_containers);

        let o = AnalyzeOptions { all_containers: true, ..Default::default() }.normalized();
        assert!(!o.images && o.containers);

        let o = AnalyzeOptions { images: true, ..Default::default() }.normalized();
        assert!(o.images && !o.containers);
    }

    #[test]
    fn failing_entity_does_not_stop_batch() {
        let mut backend = FakeBackend::default();
        backend.images = vec![image("missing"), image("good")];
        backend.inspects.insert("good".into(), clean_image_inspect());

        let (res, out) = run(&backend, AnalyzeOptions { images: true, ..Default::default() });
        res.unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[ERROR    ] image web:1.0 (missing): "));
        assert!(lines[0].contains("No such object"));
        assert_eq!(lines[1], "[OK       ] image web:1.0 (good): No issues detected for this image.");
    }

    #[test]
    fn unavailable_backend_aborts_pass() {
        let backend = FakeBackend { unavailable: true, ..Default::default() };
        let (res, out) = run(&backend, AnalyzeOptions::default());
        assert!(res.unwrap_err().is_unavailable());
        assert!(out.is_empty());
        assert_eq!(*backend.list_calls.borrow(), 1);
    }

    #[test]
    fn empty_container_list_prints_notice() {
        let backend = FakeBackend::default();
        let (res, out) = run(&backend, AnalyzeOptions { containers: true, ..Default::default() });
        res.unwrap();
        assert_eq!(out.trim(), "No containers found.");
    }

    #[test]
    fn all_containers_includes_stopped() {
        let mut backend = FakeBackend::default();
        backend.containers = vec![container("c1", "web")];
        backend.stopped = vec![container("c2", "batch")];
        backend.inspects.insert("c1".into(), json!({ "State": { "Running": true } }));
        backend.inspects.insert("c2".into(), json!({ "State": { "Running": false } }));

        let (_, running_only) = run(&backend, AnalyzeOptions { containers: true, ..Default::default() });
        assert!(!running_only.contains("batch"));

        let (res, out) = run(&backend, AnalyzeOptions { all_containers: true, ..Default::default() });
        res.unwrap();
        assert!(out.contains("[WARNING  ] container batch (c2): Container is not running."));
    }

    #[test]
    fn images_and_containers_by_default() {
        let mut backend = FakeBackend::default();
        backend.images = vec![image("i1")];
        backend.containers = vec![container("c1", "web")];
        backend.inspects.insert("i1".into(), clean_image_inspect());
        backend.inspects.insert("c1".into(), json!({ "State": { "Running": true } }));

        let (res, out) = run(&backend, AnalyzeOptions::default());
        res.unwrap();
        let image_pos = out.find("image web:1.0 (i1)").unwrap();
        let container_pos = out.find("container web (c1)").unwrap();
        assert!(image_pos < container_pos);
    }

    #[test]
    fn history_feeds_large_layer_rule() {
        let mut backend = FakeBackend::default();
        backend.images = vec![image("i1")];
        backend.inspects.insert("i1".into(), clean_image_inspect());
        backend.histories.insert(
            "i1".into(),
            vec![crate::docker::HistoryEntry {
                created_by: "RUN pip install torch".into(),
                size: "2.3GB".into(),
                ..Default::default()
            }],
        );

        let recs = analyze_image(&backend, &backend.images[0], &Thresholds::default());
        assert_eq!(recs.len(), 1);
        assert!(recs[0].message.contains("RUN pip install torch"));
    }

    #[test]
    fn interrupt_mid_pass_drops_remaining_entities() {
        let stop = std::sync::Arc::new(AtomicBool::new(false));
        let mut backend = FakeBackend::default();
        backend.images = vec![image("i1"), image("i2"), image("i3")];
        backend.containers = vec![container("c1", "web")];
        backend.inspects.insert("i1".into(), clean_image_inspect());
        backend.inspects.insert("i3".into(), clean_image_inspect());
        backend.interrupt_on = Some(("i2".into(), stop.clone()));

        let mut r = Renderer::new(Format::Text, Vec::new());
        analyze_until_stopped(&backend, &AnalyzeOptions::default().normalized(), &Thresholds::default(), &stop, &mut r)
            .unwrap();
        let out = String::from_utf8(r.into_inner()).unwrap();

        assert_eq!(out.lines().collect::<Vec<_>>(), vec!["[OK       ] image web:1.0 (i1): No issues detected for this image."]);
        assert!(!out.contains("ERROR"));
        assert_eq!(*backend.inspect_calls.borrow(), vec!["i1", "i2"]);
        // 容器列表不再获取
        assert_eq!(*backend.list_calls.borrow(), 1);
    }

    #[test]
    fn preset_stop_skips_listing() {
        let backend = FakeBackend::default();
        let stop = AtomicBool::new(true);
        let mut r = Renderer::new(Format::Text, Vec::new());
        analyze_until_stopped(&backend, &AnalyzeOptions::default().normalized(), &Thresholds::default(), &stop, &mut r)
            .unwrap();
        assert!(r.into_inner().is_empty());
        assert_eq!(*backend.list_calls.borrow(), 0);
    }
}
