//! # qa-press – question/answer transcripts → paginated PDF
//!
//! Takes a title and an ordered list of question/answer pairs (answers in
//! markdown) and lays them out as a multi-page document with margins,
//! automatic page breaks and a title + page-number footer on every page.
//!
//! 1. **Normalise** – answer markdown → plain text ([`markdown`])
//! 2. **Measure** – wrap text to the content width ([`fonts`])
//! 3. **Flow** – place atomic blocks, breaking pages as needed ([`flow`])
//! 4. **Compose** – title, questions, answers, then footers ([`compose`])
//! 5. **Render** – emit PDF bytes via printpdf ([`render`])

pub mod compose;
pub mod document;
pub mod error;
pub mod flow;
pub mod fonts;
pub mod markdown;
pub mod pipeline;
pub mod render;
pub mod transcript;

// Re-exports for convenience
pub use error::ExportError;
pub use pipeline::{compose_document, export_pdf, ExportConfig, PageOrientation};
pub use render::{export_filename, DocumentSink, PdfFileSink};
pub use transcript::{derive_title, QaPair, Transcript};
