//! Markdown → plain text.
//!
//! Answers arrive as model-generated markdown. The layout engine only needs
//! the readable text, split into paragraphs separated by a blank line, so
//! styling is dropped and structure is reduced to line and paragraph breaks.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::error::ExportError;

/// Turns raw markdown into plain renderable text.
///
/// Implementations should degrade malformed input to best-effort text; an
/// `Err` aborts the export it is part of.
pub trait MarkdownNormalizer {
    fn to_plain_text(&self, markdown: &str) -> Result<String, ExportError>;
}

/// `pulldown-cmark` backed normalizer. CommonMark never rejects input, so
/// this implementation never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextNormalizer;

impl MarkdownNormalizer for PlainTextNormalizer {
    fn to_plain_text(&self, markdown: &str) -> Result<String, ExportError> {
        Ok(markdown_to_plain_text(markdown))
    }
}

#[derive(Default)]
struct TextCollector {
    paragraphs: Vec<String>,
    current: String,
    /// Next number for each open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
}

impl TextCollector {
    fn flush(&mut self) {
        let text = self.current.trim_end().trim_start_matches(' ');
        if !text.trim().is_empty() {
            self.paragraphs.push(text.to_string());
        }
        self.current.clear();
    }

    /// Close a code block as a single paragraph. Indentation survives and a
    /// blank line inside the block becomes a lone no-break space, so the
    /// `"\n\n"` paragraph separator never appears within it.
    fn flush_code_block(&mut self) {
        let code = self
            .current
            .trim_matches('\n')
            .lines()
            .map(|line| {
                let line = line.trim_end();
                if line.is_empty() { "\u{00A0}" } else { line }
            })
            .collect::<Vec<_>>()
            .join("\n");
        if !code.trim().is_empty() {
            self.paragraphs.push(code);
        }
        self.current.clear();
    }

    fn start_item(&mut self) {
        self.flush();
        match self.lists.last_mut() {
            Some(Some(n)) => {
                self.current.push_str(&format!("{n}. "));
                *n += 1;
            }
            _ => self.current.push_str("\u{2022} "),
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.paragraphs.join("\n\n")
    }
}

/// Reduce `markdown` to plain text paragraphs joined by `"\n\n"`.
pub fn markdown_to_plain_text(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut out = TextCollector::default();

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::List(start)) => {
                out.flush();
                out.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                out.flush();
                out.lists.pop();
            }
            Event::Start(Tag::Item) => out.start_item(),
            Event::End(TagEnd::CodeBlock) => out.flush_code_block(),
            Event::Start(Tag::CodeBlock(_))
            | Event::Start(Tag::Heading { .. })
            | Event::Start(Tag::TableRow)
            | Event::Start(Tag::TableHead) => out.flush(),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::TableRow)
            | Event::End(TagEnd::TableHead) => out.flush(),
            Event::End(TagEnd::TableCell) => out.current.push_str("  "),
            Event::Text(text) => out.current.push_str(&text),
            Event::Code(code) => out.current.push_str(&code),
            Event::SoftBreak => out.current.push(' '),
            Event::HardBreak => out.current.push('\n'),
            Event::TaskListMarker(checked) => {
                out.current.push_str(if checked { "[x] " } else { "[ ] " })
            }
            Event::Rule => out.flush(),
            // Raw HTML, footnote markers and the like carry no readable text.
            _ => {}
        }
    }

    out.finish()
}
