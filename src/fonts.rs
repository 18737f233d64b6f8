//! Font metrics and text measurement.
//!
//! Rendering always uses the PDF builtin Helvetica faces, so by default we
//! measure with Helvetica-like heuristic advances. A metric-compatible TTF
//! (e.g. Liberation Sans) can be loaded through `ttf-parser` for tighter
//! wrapping; glyph advances are then read straight from the font.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// Family name of the builtin face every document is drawn with.
pub const DEFAULT_FAMILY: &str = "Helvetica";

/// Fraction of the font size taken by the glyph ascender.
pub const ASCENDER_RATIO: f32 = 0.75;

/// Font selection for one block of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

impl FontSpec {
    pub fn regular(size: f32) -> Self {
        Self {
            family: DEFAULT_FAMILY.to_string(),
            size,
            bold: false,
            italic: false,
        }
    }

    pub fn bold(size: f32) -> Self {
        Self {
            bold: true,
            ..Self::regular(size)
        }
    }

    fn key(&self) -> FontKey {
        FontKey {
            family: self.family.clone(),
            bold: self.bold,
            italic: self.italic,
        }
    }
}

/// Metrics of a loaded face, in font units.
#[derive(Clone)]
struct FontData {
    /// Raw font bytes, kept for ttf-parser's zero-copy API. Empty for the
    /// synthetic builtin metrics.
    bytes: Vec<u8>,
    units_per_em: f32,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FontKey {
    family: String,
    bold: bool,
    italic: bool,
}

/// Registry of faces used to measure text.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
}

impl FontManager {
    /// Manager with only the builtin heuristic metrics.
    pub fn new() -> Self {
        let mut fonts = HashMap::new();
        for bold in [false, true] {
            fonts.insert(
                FontKey {
                    family: DEFAULT_FAMILY.to_string(),
                    bold,
                    italic: false,
                },
                FontData {
                    bytes: Vec::new(),
                    units_per_em: 1000.0,
                },
            );
        }
        Self { fonts }
    }

    /// Load a TTF/OTF face whose advances replace the heuristic for
    /// `family` at the given weight/style.
    pub fn load_font(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        bytes: Vec<u8>,
    ) -> Result<(), ExportError> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| ExportError::Font(format!("failed to parse font: {e}")))?;
        let units_per_em = face.units_per_em() as f32;

        log::debug!("loaded metrics font {family} (bold={bold}, italic={italic})");
        self.fonts.insert(
            FontKey {
                family: family.to_string(),
                bold,
                italic,
            },
            FontData {
                bytes,
                units_per_em,
            },
        );
        Ok(())
    }

    /// True when `family`/`bold`/`italic` is backed by real font bytes.
    pub fn has_real_metrics(&self, font: &FontSpec) -> bool {
        self.fonts
            .get(&font.key())
            .map(|d| !d.bytes.is_empty())
            .unwrap_or(false)
    }

    /// Width of `text` in points when set in `font`.
    pub fn measure_text_width(&self, text: &str, font: &FontSpec) -> f32 {
        let data = self.fonts.get(&font.key());

        let Some(data) = data.filter(|d| !d.bytes.is_empty()) else {
            return heuristic_width(text, font);
        };

        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) => {
                let scale = font.size / data.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        None => font.size * 0.5,
                    })
                    .sum()
            }
            Err(_) => heuristic_width(text, font),
        }
    }

    /// Height one wrapped line occupies.
    pub fn line_height(&self, font: &FontSpec, line_height_factor: f32) -> f32 {
        font.size * line_height_factor
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Average advance of 0.5 em, bold about 10 % wider.
fn heuristic_width(text: &str, font: &FontSpec) -> f32 {
    let avg = if font.bold { 0.55 } else { 0.5 };
    text.chars().count() as f32 * font.size * avg
}

/// Word-wrap `text` so no line is wider than `max_width`.
///
/// Breaks only at whitespace; a single word wider than `max_width` keeps its
/// own line unmodified. Explicit newlines always start a new line, and a
/// line's leading indentation (tabs as four spaces) is repeated on every
/// line it wraps onto. Blank input yields no lines.
pub fn wrap_text(text: &str, font: &FontSpec, max_width: f32, fonts: &FontManager) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut lines: Vec<String> = Vec::new();
    for segment in text.trim_matches('\n').split('\n') {
        let body = segment.trim_start();
        let words: Vec<&str> = body.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }
        let indent = segment[..segment.len() - body.len()].replace('\t', "    ");

        let mut current_line = String::new();
        for word in &words {
            if current_line.is_empty() {
                current_line = format!("{indent}{word}");
                continue;
            }
            let candidate = format!("{current_line} {word}");
            if fonts.measure_text_width(&candidate, font) > max_width {
                lines.push(std::mem::replace(&mut current_line, format!("{indent}{word}")));
            } else {
                current_line = candidate;
            }
        }
        lines.push(current_line);
    }
    lines
}

/// Shorten `text` with a trailing `...` until it fits `max_width`.
pub fn truncate_to_width(text: &str, font: &FontSpec, max_width: f32, fonts: &FontManager) -> String {
    if fonts.measure_text_width(text, font) <= max_width {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    for keep in (0..chars.len()).rev() {
        let candidate: String = chars[..keep].iter().collect::<String>().trim_end().to_string() + "...";
        if fonts.measure_text_width(&candidate, font) <= max_width {
            return candidate;
        }
    }
    String::new()
}
