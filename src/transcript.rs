//! Question/answer transcript – the input of an export.

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// Longest derived title, in characters, before `...` is appended.
pub const TITLE_MAX_CHARS: usize = 40;

/// Title used when nothing better can be derived.
pub const FALLBACK_TITLE: &str = "Transcript";

/// One asked question and its (markdown) answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    /// Raw markdown. Empty while the answer is still being generated.
    #[serde(default)]
    pub answer: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Answer not generated yet.
    pub fn is_pending(&self) -> bool {
        self.answer.trim().is_empty()
    }
}

/// A transcript as read from disk: either a bare array of pairs or an
/// object with an optional title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub title: Option<String>,
    pub pairs: Vec<QaPair>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptRepr {
    Full(Transcript),
    Pairs(Vec<QaPair>),
}

impl Transcript {
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let repr: TranscriptRepr = serde_json::from_str(json)?;
        Ok(match repr {
            TranscriptRepr::Full(t) => t,
            TranscriptRepr::Pairs(pairs) => Transcript { title: None, pairs },
        })
    }

    /// Explicit title if set, otherwise one derived from the first question.
    pub fn resolved_title(&self) -> String {
        match &self.title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => derive_title(self.pairs.first().map(|p| p.question.as_str()).unwrap_or("")),
        }
    }
}

/// Build a document title from the first question of a chat.
///
/// Whitespace is collapsed and long questions are cut at
/// [`TITLE_MAX_CHARS`] characters with a trailing `...`.
pub fn derive_title(first_question: &str) -> String {
    let collapsed = first_question.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return FALLBACK_TITLE.to_string();
    }
    if collapsed.chars().count() <= TITLE_MAX_CHARS {
        return collapsed;
    }
    let head: String = collapsed.chars().take(TITLE_MAX_CHARS).collect();
    format!("{}...", head.trim_end())
}
