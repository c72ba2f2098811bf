//! 周期性分析：每轮重新读取 docker 状态，直到收到停止信号

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::output::Renderer;
use super::rules::Thresholds;
use super::{analyze_until_stopped, AnalyzeOptions};
use crate::docker::DockerBackend;
use crate::utils::{AdviseError, Result};

const SLEEP_SLICE: Duration = Duration::from_millis(200);

/// Install a Ctrl+C handler that only flips the returned flag.
pub fn install_stop_handler() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();
    ctrlc::set_handler(move || {
        s.store(true, Ordering::SeqCst);
    })
    .map_err(|e| AdviseError::System(format!("failed to set Ctrl-C handler: {}", e)))?;
    Ok(stop)
}

pub fn watch<B, W>(
    backend: &B,
    opts: &AnalyzeOptions,
    thresholds: &Thresholds,
    interval: Duration,
    stop: &AtomicBool,
    out: &mut Renderer<W>,
) -> Result<()>
where
    B: DockerBackend + ?Sized,
    W: Write,
{
    if interval.is_zero() {
        return Err(AdviseError::System(
            "Watch interval must be greater than zero seconds.".to_string(),
        ));
    }

    while !stop.load(Ordering::SeqCst) {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        out.notice(&format!("\n=== {} ===", now))?;

        // 单轮失败只跳过本轮
        if let Err(e) = analyze_until_stopped(backend, opts, thresholds, stop, out) {
            eprintln!("{}", e);
        }

        sleep_unless_stopped(interval, stop);
    }

    out.notice("\nStopping watch mode.")?;
    Ok(())
}

/// Sleep for `total`, waking early once `stop` is set.
/// A deadline past what `Instant` can represent means sleep until stopped.
fn sleep_unless_stopped(total: Duration, stop: &AtomicBool) {
    let deadline = Instant::now().checked_add(total);
    while !stop.load(Ordering::SeqCst) {
        let slice = match deadline {
            Some(d) => {
                let now = Instant::now();
                if now >= d {
                    break;
                }
                SLEEP_SLICE.min(d - now)
            }
            None => SLEEP_SLICE,
        };
        std::thread::sleep(slice);
    }
}
