//! Pipeline – ties together normalisation, measurement, page flow,
//! composition and rendering into a single function call.

use serde::{Deserialize, Serialize};

use crate::compose::Composer;
use crate::document::Document;
use crate::error::ExportError;
use crate::flow::{FlowGeometry, OversizePolicy};
use crate::fonts::{FontManager, FontSpec};
use crate::markdown::PlainTextNormalizer;
use crate::render::render_pdf;
use crate::transcript::QaPair;

/// Default page margin in points.
pub const PAGE_MARGIN_PT: f32 = 40.0;

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width > height.
    Landscape,
}

/// Layout constants for one export run.
///
/// Deserialises with every field optional, so a JSON file only needs to name
/// what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Page height in points (default: A4 = 841.89).
    pub page_height: f32,
    /// Margin on all four sides, in points (default: 40).
    pub page_margin: f32,
    /// Swaps effective width/height when `Landscape`.
    pub orientation: PageOrientation,
    pub title_font_size: f32,
    pub question_font_size: f32,
    pub answer_font_size: f32,
    pub footer_font_size: f32,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f32,
    /// Gap after every block.
    pub block_spacing: f32,
    /// Extra gap below the title block.
    pub title_spacing: f32,
    /// Extra gap after each answer.
    pub pair_spacing: f32,
    pub oversize_policy: OversizePolicy,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            page_margin: PAGE_MARGIN_PT,
            orientation: PageOrientation::Portrait,
            title_font_size: 18.0,
            question_font_size: 12.0,
            answer_font_size: 11.0,
            footer_font_size: 9.0,
            line_height_factor: 1.4,
            block_spacing: 6.0,
            title_spacing: 10.0,
            pair_spacing: 14.0,
            oversize_policy: OversizePolicy::Overflow,
        }
    }
}

impl ExportConfig {
    /// Effective page width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width,
            PageOrientation::Landscape => self.page_height,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height,
            PageOrientation::Landscape => self.page_width,
        }
    }

    /// Create an A4 landscape config.
    pub fn a4_landscape() -> Self {
        Self {
            orientation: PageOrientation::Landscape,
            ..Self::default()
        }
    }

    pub fn content_width(&self) -> f32 {
        self.effective_width() - 2.0 * self.page_margin
    }

    pub fn usable_height(&self) -> f32 {
        self.flow_geometry().usable_height()
    }

    pub fn flow_geometry(&self) -> FlowGeometry {
        FlowGeometry {
            page_height: self.effective_height(),
            top_margin: self.page_margin,
            bottom_margin: self.page_margin,
            block_spacing: self.block_spacing,
        }
    }

    pub fn title_font(&self) -> FontSpec {
        FontSpec::bold(self.title_font_size)
    }

    pub fn question_font(&self) -> FontSpec {
        FontSpec::bold(self.question_font_size)
    }

    pub fn answer_font(&self) -> FontSpec {
        FontSpec::regular(self.answer_font_size)
    }

    pub fn footer_font(&self) -> FontSpec {
        FontSpec::regular(self.footer_font_size)
    }

    /// Deserialise from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject geometry that leaves no room for content.
    pub fn validate(&self) -> Result<(), ExportError> {
        let sizes = [
            self.title_font_size,
            self.question_font_size,
            self.answer_font_size,
            self.footer_font_size,
            self.line_height_factor,
        ];
        if sizes.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(ExportError::Config(
                "font sizes and line height factor must be positive".to_string(),
            ));
        }
        let spacings = [
            ("block_spacing", self.block_spacing),
            ("title_spacing", self.title_spacing),
            ("pair_spacing", self.pair_spacing),
        ];
        if let Some((name, value)) = spacings.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(ExportError::Config(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }
        if self.page_margin < 0.0 || self.content_width() <= 0.0 || self.usable_height() <= 0.0 {
            return Err(ExportError::Config(format!(
                "margin {}pt leaves no content area on a {}x{}pt page",
                self.page_margin,
                self.effective_width(),
                self.effective_height()
            )));
        }
        Ok(())
    }
}

/// Lay out a transcript without rendering it – useful for testing and for
/// inspecting the page structure.
pub fn compose_document(
    title: &str,
    pairs: &[QaPair],
    config: &ExportConfig,
) -> Result<Document, ExportError> {
    let fonts = FontManager::default();
    compose_document_with_fonts(title, pairs, config, &fonts)
}

/// Like [`compose_document`] but measuring with caller-supplied fonts.
pub fn compose_document_with_fonts(
    title: &str,
    pairs: &[QaPair],
    config: &ExportConfig,
    fonts: &FontManager,
) -> Result<Document, ExportError> {
    config.validate()?;
    Composer::new(config, fonts, &PlainTextNormalizer).compose(title, pairs)
}

/// Full pipeline: transcript → PDF bytes.
///
/// Returns `(pdf_bytes, document)`.
pub fn export_pdf(
    title: &str,
    pairs: &[QaPair],
    config: &ExportConfig,
) -> Result<(Vec<u8>, Document), ExportError> {
    let document = compose_document(title, pairs, config)?;
    let bytes = render_pdf(&document)?;
    log::info!(
        "exported '{}' ({} page{}, {} bytes)",
        document.title,
        document.page_count(),
        if document.page_count() == 1 { "" } else { "s" },
        bytes.len()
    );
    Ok((bytes, document))
}
