pub mod client;
pub mod normalize;
pub mod prompt;
pub mod taxonomy;
pub mod types;

pub use client::{AnalysisClient, GeminiClient, MockAnalysisClient, ModelOutput};
pub use normalize::normalize;
pub use types::{AbnormalFinding, CanonicalReport, CategorySummary, Patient};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Upstream analysis call failed: {0}")]
    Upstream(String),

    /// Every parse and repair attempt failed. The raw model text is kept
    /// for diagnostics but never shown to API callers.
    #[error("Model output could not be parsed as a report")]
    InvalidModelOutput { raw: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
