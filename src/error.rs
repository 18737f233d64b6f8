//! Error taxonomy for transcript export.
//!
//! Every failure aborts the whole export; no partially paginated document is
//! ever handed to a sink.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// Export was invoked with nothing to export.
    #[error("transcript has no answered question/answer pairs")]
    EmptyTranscript,

    #[error("question {index} is empty")]
    EmptyQuestion { index: usize },

    /// The markdown normalizer could not turn an answer into plain text.
    #[error("content render failed: {0}")]
    ContentRender(String),

    /// A layout invariant was broken. Always a bug in measurement or flow.
    #[error("internal layout error: {0}")]
    InternalLayout(String),

    #[error("block of {height:.1}pt exceeds usable page height of {usable:.1}pt")]
    BlockTooLarge { height: f32, usable: f32 },

    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("font error: {0}")]
    Font(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
