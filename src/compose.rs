//! Composer – lays out a titled transcript into pages.
//!
//! Two passes:
//! 1. Content: title block, then each question and answer paragraph as
//!    atomic blocks through [`PageFlow`]. This fixes the page count.
//! 2. Footers: once the count is final, every page gets the document title
//!    bottom-left and its page number bottom-right.

use crate::document::{BlockKind, Document, Footer, Page, TextBlock, TextLine};
use crate::error::ExportError;
use crate::flow::PageFlow;
use crate::fonts::{truncate_to_width, wrap_text, FontManager, FontSpec};
use crate::markdown::MarkdownNormalizer;
use crate::pipeline::ExportConfig;
use crate::transcript::QaPair;

/// Minimum gap between the footer label and the page number.
const FOOTER_GAP_PT: f32 = 12.0;

pub struct Composer<'a> {
    config: &'a ExportConfig,
    fonts: &'a FontManager,
    normalizer: &'a dyn MarkdownNormalizer,
}

impl<'a> Composer<'a> {
    pub fn new(
        config: &'a ExportConfig,
        fonts: &'a FontManager,
        normalizer: &'a dyn MarkdownNormalizer,
    ) -> Self {
        Self {
            config,
            fonts,
            normalizer,
        }
    }

    /// Lay out `pairs` under `title`.
    ///
    /// Pairs whose answer is still pending are left out. Any failure aborts
    /// the whole composition; no partial document is returned.
    pub fn compose(&self, title: &str, pairs: &[QaPair]) -> Result<Document, ExportError> {
        if pairs.is_empty() {
            return Err(ExportError::EmptyTranscript);
        }
        if let Some(index) = pairs.iter().position(|p| p.question.trim().is_empty()) {
            return Err(ExportError::EmptyQuestion { index });
        }

        let answered: Vec<&QaPair> = pairs.iter().filter(|p| !p.is_pending()).collect();
        if answered.is_empty() {
            return Err(ExportError::EmptyTranscript);
        }
        if answered.len() < pairs.len() {
            log::warn!(
                "skipping {} pair(s) whose answer is still pending",
                pairs.len() - answered.len()
            );
        }

        let mut flow = PageFlow::new(self.config.flow_geometry(), self.config.oversize_policy);

        let title_block = self.text_block(BlockKind::Title, title, self.config.title_font(), true);
        if !title_block.lines.is_empty() {
            flow.place(title_block)?;
            flow.skip(self.config.title_spacing)?;
        }

        for pair in answered {
            let question =
                self.text_block(BlockKind::Question, &pair.question, self.config.question_font(), false);
            flow.place(question)?;

            let plain = self.normalizer.to_plain_text(&pair.answer)?;
            for paragraph in split_paragraphs(&plain) {
                let answer =
                    self.text_block(BlockKind::Answer, paragraph, self.config.answer_font(), false);
                if !answer.lines.is_empty() {
                    flow.place(answer)?;
                }
            }
            flow.skip(self.config.pair_spacing)?;
        }

        let mut pages = flow.finish()?;
        self.stamp_footers(title, &mut pages)?;

        Ok(Document {
            title: title.to_string(),
            page_width_pt: self.config.effective_width(),
            page_height_pt: self.config.effective_height(),
            pages,
        })
    }

    /// Wrap `text` to the content width. `y` is filled in on placement.
    fn text_block(&self, kind: BlockKind, text: &str, font: FontSpec, centered: bool) -> TextBlock {
        let width = self.config.content_width();
        let line_height = self.fonts.line_height(&font, self.config.line_height_factor);
        let lines: Vec<TextLine> = wrap_text(text, &font, width, self.fonts)
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let x_offset = if centered {
                    ((width - self.fonts.measure_text_width(&line, &font)) / 2.0).max(0.0)
                } else {
                    0.0
                };
                TextLine {
                    text: line,
                    x_offset,
                    y_offset: i as f32 * line_height,
                }
            })
            .collect();

        TextBlock {
            kind,
            x: self.config.page_margin,
            y: 0.0,
            width,
            height: lines.len() as f32 * line_height,
            font,
            line_height,
            lines,
        }
    }

    /// Write exactly one footer onto every page. Runs only after content
    /// layout has fixed the page count.
    fn stamp_footers(&self, title: &str, pages: &mut [Page]) -> Result<(), ExportError> {
        let font = self.config.footer_font();
        let margin = self.config.page_margin;
        let line_height = self.fonts.line_height(&font, self.config.line_height_factor);
        let y = self.config.effective_height() - margin + ((margin - line_height) / 2.0).max(0.0);
        let right_edge = self.config.effective_width() - margin;

        for (i, page) in pages.iter_mut().enumerate() {
            if page.page_index != i + 1 {
                return Err(ExportError::InternalLayout(format!(
                    "page at position {} carries index {}",
                    i + 1,
                    page.page_index
                )));
            }
            if page.footer.is_some() {
                return Err(ExportError::InternalLayout(format!(
                    "page {} already has a footer",
                    page.page_index
                )));
            }

            let page_number = page.page_index.to_string();
            let number_width = self.fonts.measure_text_width(&page_number, &font);
            let label_room = self.config.content_width() - number_width - FOOTER_GAP_PT;
            let label = truncate_to_width(title, &font, label_room, self.fonts);

            page.footer = Some(Footer {
                label,
                label_x: margin,
                page_number,
                page_number_x: right_edge - number_width,
                y,
                font: font.clone(),
            });
        }
        log::debug!("stamped footers on {} page(s)", pages.len());
        Ok(())
    }
}

/// Split normalised text at blank lines into non-empty paragraphs.
fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n")
        .map(|p| p.trim_matches('\n'))
        .filter(|p| !p.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::PlainTextNormalizer;

    struct FailingNormalizer;

    impl MarkdownNormalizer for FailingNormalizer {
        fn to_plain_text(&self, _markdown: &str) -> Result<String, ExportError> {
            Err(ExportError::ContentRender("boom".to_string()))
        }
    }

    fn compose(title: &str, pairs: &[QaPair]) -> Result<Document, ExportError> {
        let config = ExportConfig::default();
        let fonts = FontManager::default();
        Composer::new(&config, &fonts, &PlainTextNormalizer).compose(title, pairs)
    }

    #[test]
    fn single_pair_single_page() {
        let doc = compose("Arithmetic", &[QaPair::new("What is 2+2?", "**4**")]).unwrap();
        assert_eq!(doc.page_count(), 1);
        let blocks: Vec<_> = doc.pages[0].blocks.iter().collect();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].kind, BlockKind::Title);
        assert_eq!(blocks[1].kind, BlockKind::Question);
        assert_eq!(blocks[1].text(), "What is 2+2?");
        assert_eq!(blocks[2].kind, BlockKind::Answer);
        assert_eq!(blocks[2].text(), "4");

        let footer = doc.pages[0].footer.as_ref().unwrap();
        assert_eq!(footer.label, "Arithmetic");
        assert_eq!(footer.page_number, "1");
        assert!(footer.page_number_x > footer.label_x);
    }

    #[test]
    fn title_is_centered() {
        let doc = compose("Hi", &[QaPair::new("q", "a")]).unwrap();
        let title = &doc.pages[0].blocks[0];
        let config = ExportConfig::default();
        // "Hi" in 18pt bold heuristic: 2 × 18 × 0.55 = 19.8pt
        let expected = (config.content_width() - 19.8) / 2.0;
        assert!((title.lines[0].x_offset - expected).abs() < 0.01);
    }

    #[test]
    fn blocks_follow_each_other_with_spacing() {
        let doc = compose("T", &[QaPair::new("q", "a")]).unwrap();
        let config = ExportConfig::default();
        let b = &doc.pages[0].blocks;
        assert_eq!(b[0].y, config.page_margin);
        let expected_q = b[0].bottom() + config.block_spacing + config.title_spacing;
        assert!((b[1].y - expected_q).abs() < 0.01);
        assert!((b[2].y - (b[1].bottom() + config.block_spacing)).abs() < 0.01);
    }

    #[test]
    fn empty_transcript_is_rejected() {
        assert!(matches!(compose("T", &[]), Err(ExportError::EmptyTranscript)));
    }

    #[test]
    fn all_pending_is_rejected() {
        let pairs = [QaPair::new("q", ""), QaPair::new("q2", "  ")];
        assert!(matches!(compose("T", &pairs), Err(ExportError::EmptyTranscript)));
    }

    #[test]
    fn pending_pairs_are_skipped() {
        let pairs = [QaPair::new("q1", "a1"), QaPair::new("q2", "")];
        let doc = compose("T", &pairs).unwrap();
        let questions: Vec<_> = doc
            .blocks()
            .filter(|(_, b)| b.kind == BlockKind::Question)
            .map(|(_, b)| b.text())
            .collect();
        assert_eq!(questions, vec!["q1"]);
    }

    #[test]
    fn empty_question_is_rejected() {
        let pairs = [QaPair::new("q", "a"), QaPair::new(" ", "a")];
        assert!(matches!(
            compose("T", &pairs),
            Err(ExportError::EmptyQuestion { index: 1 })
        ));
    }

    #[test]
    fn normalizer_failure_aborts_export() {
        let config = ExportConfig::default();
        let fonts = FontManager::default();
        let result = Composer::new(&config, &fonts, &FailingNormalizer)
            .compose("T", &[QaPair::new("q", "a")]);
        assert!(matches!(result, Err(ExportError::ContentRender(_))));
    }

    #[test]
    fn answer_paragraphs_become_separate_blocks() {
        let doc = compose("T", &[QaPair::new("q", "one\n\ntwo\n\n- three")]).unwrap();
        let answers: Vec<_> = doc
            .blocks()
            .filter(|(_, b)| b.kind == BlockKind::Answer)
            .map(|(_, b)| b.text())
            .collect();
        assert_eq!(answers, vec!["one", "two", "\u{2022} three"]);
    }

    #[test]
    fn code_block_is_one_atomic_block_with_indentation() {
        let answer = "```rust\nfn main() {\n    let x = 1;\n\n    x\n}\n```";
        let doc = compose("T", &[QaPair::new("q", answer)]).unwrap();
        let answers: Vec<_> = doc
            .blocks()
            .filter(|(_, b)| b.kind == BlockKind::Answer)
            .map(|(_, b)| b)
            .collect();
        assert_eq!(answers.len(), 1);
        let lines: Vec<&str> = answers[0].lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(lines, vec!["fn main() {", "    let x = 1;", "", "    x", "}"]);
    }

    #[test]
    fn long_title_is_truncated_in_footer_only() {
        let title = "word ".repeat(60);
        let doc = compose(title.trim(), &[QaPair::new("q", "a")]).unwrap();
        let footer = doc.pages[0].footer.as_ref().unwrap();
        assert!(footer.label.ends_with("..."));
        assert!(doc.pages[0].blocks[0].lines.len() > 1);
    }

    #[test]
    fn empty_title_places_no_title_block() {
        let doc = compose("", &[QaPair::new("q", "a")]).unwrap();
        assert_eq!(doc.pages[0].blocks[0].kind, BlockKind::Question);
        assert_eq!(doc.pages[0].footer.as_ref().unwrap().label, "");
    }
}
