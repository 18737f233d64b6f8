//! PDF sink – serialises a composed [`Document`] with `printpdf` (v0.8
//! ops-based API) and names the output file after the document title.

use std::fs;
use std::path::{Path, PathBuf};

use printpdf::*;

use crate::document::{Document, Footer, TextBlock};
use crate::error::ExportError;
use crate::fonts::{FontSpec, ASCENDER_RATIO};

/// Stem used when a title yields an empty filename.
const FALLBACK_STEM: &str = "transcript";

const PT_TO_MM: f32 = 0.352778;

/// Something that persists a finished document.
pub trait DocumentSink {
    /// Write `document`, returning where it went.
    fn write(&self, document: &Document) -> Result<PathBuf, ExportError>;
}

/// Writes `<dir>/<export_filename(title)>`.
#[derive(Debug, Clone)]
pub struct PdfFileSink {
    pub dir: PathBuf,
}

impl PdfFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DocumentSink for PdfFileSink {
    fn write(&self, document: &Document) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(export_filename(&document.title));
        write_pdf(document, &path)?;
        Ok(path)
    }
}

/// Output filename for a title: every character outside `[a-zA-Z0-9]`
/// becomes `_`, the result is lower-cased and `.pdf` appended.
pub fn export_filename(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        format!("{FALLBACK_STEM}.pdf")
    } else {
        format!("{stem}.pdf")
    }
}

/// Render `document` and write it to `path`, creating parent directories.
pub fn write_pdf(document: &Document, path: &Path) -> Result<(), ExportError> {
    // Render fully before touching the filesystem so a failure leaves no file.
    let bytes = render_pdf(document)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, &bytes)?;
    log::info!("wrote '{}' ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Render a document into PDF bytes.
pub fn render_pdf(document: &Document) -> Result<Vec<u8>, ExportError> {
    if document.pages.is_empty() {
        return Err(ExportError::Render("document has no pages".to_string()));
    }
    if let Some(page) = document.pages.iter().find(|p| p.footer.is_none()) {
        return Err(ExportError::Render(format!(
            "page {} has no footer",
            page.page_index
        )));
    }

    let page_w = Mm(document.page_width_pt * PT_TO_MM);
    let page_h = Mm(document.page_height_pt * PT_TO_MM);

    let mut doc = PdfDocument::new(&document.title);
    let mut pages = Vec::with_capacity(document.pages.len());

    for page in &document.pages {
        let mut ops = Vec::new();
        for block in &page.blocks {
            render_block(&mut ops, block, document.page_height_pt);
        }
        if let Some(footer) = &page.footer {
            render_footer(&mut ops, footer, document.page_height_pt);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    doc.with_pages(pages);
    let mut warnings = Vec::new();
    // Non-secure mode so the raw `Tj` ops from `write_text` are serialised.
    let options = PdfSaveOptions {
        secure: false,
        ..PdfSaveOptions::default()
    };
    let bytes = doc.save(&options, &mut warnings);
    if !warnings.is_empty() {
        log::debug!("printpdf reported {} warning(s)", warnings.len());
    }
    Ok(bytes)
}

fn builtin_font(font: &FontSpec) -> BuiltinFont {
    match (font.bold, font.italic) {
        (true, true) => BuiltinFont::HelveticaBoldOblique,
        (true, false) => BuiltinFont::HelveticaBold,
        (false, true) => BuiltinFont::HelveticaOblique,
        (false, false) => BuiltinFont::Helvetica,
    }
}

fn render_block(ops: &mut Vec<Op>, block: &TextBlock, page_height: f32) {
    for line in &block.lines {
        if line.text.is_empty() {
            continue;
        }
        write_text(
            ops,
            &line.text,
            block.x + line.x_offset,
            block.y + line.y_offset,
            &block.font,
            page_height,
        );
    }
}

fn render_footer(ops: &mut Vec<Op>, footer: &Footer, page_height: f32) {
    if !footer.label.is_empty() {
        write_text(ops, &footer.label, footer.label_x, footer.y, &footer.font, page_height);
    }
    write_text(
        ops,
        &footer.page_number,
        footer.page_number_x,
        footer.y,
        &footer.font,
        page_height,
    );
}

/// Emit one line of text whose top edge is `top` (layout coordinates,
/// origin top-left).
fn write_text(ops: &mut Vec<Op>, text: &str, x: f32, top: f32, font: &FontSpec, page_height: f32) {
    // PDF origin is bottom-left and text is positioned by its baseline.
    let baseline = page_height - top - font.size * ASCENDER_RATIO;
    let builtin = builtin_font(font);

    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(x),
            y: Pt(baseline),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(font.size),
        font: builtin,
    });
    ops.push(Op::SetFillColor {
        col: Color::Rgb(Rgb {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            icc_profile: None,
        }),
    });
    // Empty items register the font resource on the page and write nothing.
    ops.push(Op::WriteTextBuiltinFont {
        items: Vec::new(),
        font: builtin,
    });
    // Builtin fonts read one WinAnsi byte per glyph, so the show-text
    // operand is written as raw bytes rather than through a `String`.
    ops.push(Op::Unknown {
        key: "Tj".to_string(),
        value: vec![DictItem::String {
            data: encode_winansi(text),
            literal: false,
        }],
    });
    ops.push(Op::EndTextSection);
}

/// Encode `s` as Windows-1252 (WinAnsiEncoding). Characters outside the
/// code page become `?`.
fn encode_winansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect()
}
