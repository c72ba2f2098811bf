pub mod error;
pub mod types;

pub use error::{AdviseError, Result};
pub use types::{Recommendation, Severity};
