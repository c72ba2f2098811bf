//! 输出层：把 Recommendation 渲染成 text 或 json 行

use std::io::Write;

use crate::utils::{AdviseError, Recommendation, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => Err(AdviseError::System(format!("unknown format: {}", other))),
        }
    }
}

pub struct Renderer<W: Write> {
    format: Format,
    out: W,
}

impl<W: Write> Renderer<W> {
    pub fn new(format: Format, out: W) -> Self {
        Self { format, out }
    }

    pub fn emit(&mut self, recs: &[Recommendation]) -> Result<()> {
        for rec in recs {
            let line = match self.format {
                Format::Text => text_line(rec),
                Format::Json => serde_json::to_string(rec)
                    .map_err(|e| AdviseError::System(format!("JSON serialize: {}", e)))?,
            };
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    /// Free-form status text. JSON output stays machine-readable, so
    /// notices only reach stdout in text mode.
    pub fn notice(&mut self, text: &str) -> Result<()> {
        match self.format {
            Format::Text => writeln!(self.out, "{}", text)?,
            Format::Json => tracing::info!("{}", text.trim()),
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn text_line(rec: &Recommendation) -> String {
    format!("[{:<9}] {}: {}", rec.severity.to_string(), rec.subject, rec.message)
}
