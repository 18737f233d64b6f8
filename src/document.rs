//! Paginated document – the frozen result of composition that a sink turns
//! into a file. Coordinates are in points with the origin at the top-left of
//! the page.

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::fonts::FontSpec;

/// A complete transcript layout ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Heading on page 1, footer label on every page, PDF metadata title.
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    /// Pages in order; `pages[i].page_index == i + 1`.
    pub pages: Vec<Page>,
}

/// One page of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    pub page_index: usize,
    pub blocks: Vec<TextBlock>,
    /// Written by the footer-stamping pass, never during content layout.
    pub footer: Option<Footer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Title,
    Question,
    Answer,
}

/// An atomic run of wrapped lines placed as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub kind: BlockKind,
    /// Left edge of the content area.
    pub x: f32,
    /// Top of the block.
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font: FontSpec,
    pub line_height: f32,
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// X offset within the block (for centering)
    pub x_offset: f32,
    /// Y offset from the top of the block
    pub y_offset: f32,
}

/// Running footer: document label bottom-left, page number bottom-right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footer {
    pub label: String,
    pub label_x: f32,
    pub page_number: String,
    pub page_number_x: f32,
    /// Top of the footer line.
    pub y: f32,
    pub font: FontSpec,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every block on every page, tagged with its page number.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, &TextBlock)> {
        self.pages
            .iter()
            .flat_map(|p| p.blocks.iter().map(move |b| (p.page_index, b)))
    }
}

impl Page {
    pub fn new(page_index: usize) -> Self {
        Self {
            page_index,
            blocks: Vec::new(),
            footer: None,
        }
    }
}

impl TextBlock {
    /// Plain text of the block, one line per wrapped line.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}
