//! 阈值与公共规则工具

pub const MAX_IMAGE_BYTES: u64 = 500 * 1024 * 1024;
pub const MAX_LAYERS: usize = 20;
pub const LARGE_LAYER_MB: f64 = 200.0;

/// Limits the size-based rules compare against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub max_image_bytes: u64,
    pub max_layers: usize,
    pub large_layer_mb: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_image_bytes: MAX_IMAGE_BYTES,
            max_layers: MAX_LAYERS,
            large_layer_mb: LARGE_LAYER_MB,
        }
    }
}

/// A named check over one descriptor. Returns one message per finding.
pub struct Rule<T> {
    pub name: &'static str,
    pub severity: crate::utils::Severity,
    pub check: fn(&T, &Thresholds) -> Vec<String>,
}

/// 1.5 GB style, 1024 based, one decimal.
pub fn format_bytes(num_bytes: u64) -> String {
    let mut value = num_bytes as f64;
    for suffix in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{:.1} {}", value, suffix);
        }
        value /= 1024.0;
    }
    format!("{:.1} PB", value)
}

/// Split a docker size string such as `77.8MB` or `1.2 GB` into
/// number and upper-cased unit. Zero sizes and garbage give `None`.
pub fn parse_layer_size(s: &str) -> Option<(f64, String)> {
    let s = s.trim();
    if s.is_empty() || s == "0B" || s == "0 B" {
        return None;
    }
    let split = s.find(|c: char| c.is_alphabetic())?;
    let (num_part, unit) = s.split_at(split);
    let num: f64 = num_part.trim().parse().ok()?;
    Some((num, unit.trim().to_uppercase()))
}
