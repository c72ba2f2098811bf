use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Info,
    Suggestion,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Ok => write!(f, "OK"),
            Severity::Info => write!(f, "INFO"),
            Severity::Suggestion => write!(f, "SUGGESTION"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// One advisory line about an image or container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub subject: String,
    pub severity: Severity,
    pub message: String,
}

impl Recommendation {
    pub fn new(subject: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            subject: subject.to_string(),
            severity,
            message: message.into(),
        }
    }
}
