mod analyze;
mod builder;
mod cli;
mod docker;
mod dockerfile;
mod utils;

use anyhow::Context;
use clap::Parser;
use std::io::IsTerminal;
use std::time::Duration;

use analyze::output::{Format, Renderer};
use analyze::rules::Thresholds;
use analyze::{analyze_once, watch, AnalyzeOptions};
use cli::{Cli, Commands};
use docker::CliBackend;

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default `warn` level.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let format = Format::parse(&cli.format)?;
    let backend = CliBackend::new(cli.docker.as_str());
    let stdout = std::io::stdout();

    match cli.command {
        Some(Commands::Lint { path }) => {
            dockerfile::run_lint(&path, format, &mut stdout.lock())
                .with_context(|| format!("linting {}", path.display()))?;
        }
        Some(Commands::Build { path }) => {
            let summary = builder::build_all(&backend, &path)
                .with_context(|| format!("building images under {}", path.display()))?;
            println!("Built {} image(s)", summary.built.len());
            if !summary.failed.is_empty() {
                for (dir, tag) in &summary.failed {
                    eprintln!("  failed: {} ({})", dir.display(), tag);
                }
                anyhow::bail!("{} build(s) failed", summary.failed.len());
            }
        }
        None => {
            let opts = AnalyzeOptions {
                images: cli.images,
                containers: cli.containers,
                all_containers: cli.all_containers,
            }
            .normalized();
            let thresholds = Thresholds::default();
            let mut out = Renderer::new(format, stdout.lock());

            match cli.watch {
                Some(secs) => {
                    let stop = watch::install_stop_handler()?;
                    watch::watch(
                        &backend,
                        &opts,
                        &thresholds,
                        Duration::from_secs(secs),
                        &stop,
                        &mut out,
                    )?;
                }
                None => {
                    // 后端错误只打印，不影响退出码
                    if let Err(e) = analyze_once(&backend, &opts, &thresholds, &mut out) {
                        eprintln!("{}", e);
                    }
                }
            }
        }
    }

    Ok(())
}
