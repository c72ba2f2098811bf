use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdviseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// docker 本身无法调用（不在 PATH / 无法启动）
    #[error("{0}")]
    Unavailable(String),

    #[error("Docker command failed: {0}")]
    Command(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("System error: {0}")]
    System(String),
}

impl AdviseError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AdviseError::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, AdviseError>;
