//! Integration tests for the transcript export pipeline.
//!
//! These tests validate:
//! - Pagination never splits a block and breaks exactly at the bottom limit
//! - Every page carries exactly one footer
//! - Composition is deterministic
//! - PDF output exists and has valid format

use sha2::{Digest, Sha256};

use qa_press::document::{BlockKind, Document};
use qa_press::error::ExportError;
use qa_press::flow::OversizePolicy;
use qa_press::pipeline::{compose_document, export_pdf, ExportConfig};
use qa_press::render::{render_pdf, DocumentSink, PdfFileSink};
use qa_press::transcript::{QaPair, Transcript};

// =====================================================================
// Helper
// =====================================================================

fn default_config() -> ExportConfig {
    ExportConfig::default()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

/// `n` pairs, each answer a few paragraphs long.
fn long_transcript(n: usize) -> Vec<QaPair> {
    (0..n)
        .map(|i| {
            QaPair::new(
                format!("Question {i}: how does the layout engine decide where pages break?"),
                format!(
                    "Paragraph one of answer {i} explains that **blocks** are atomic.\n\n\
                     Paragraph two adds that the cursor is reset to the top margin after a break, \
                     and that spacing never pushes it past the bottom margin.\n\n\
                     - a bullet\n- another bullet"
                ),
            )
        })
        .collect()
}

fn layout_hash(doc: &Document) -> Vec<u8> {
    let json = doc.to_json().unwrap();
    Sha256::digest(json.as_bytes()).to_vec()
}

// =====================================================================
// Scenarios
// =====================================================================

#[test]
fn single_pair_produces_single_page() {
    let pairs = vec![QaPair::new("What is 2+2?", "**4**")];
    let doc = compose_document("Arithmetic", &pairs, &default_config()).unwrap();

    assert_eq!(doc.page_count(), 1);
    let kinds: Vec<BlockKind> = doc.pages[0].blocks.iter().map(|b| b.kind).collect();
    assert_eq!(kinds, vec![BlockKind::Title, BlockKind::Question, BlockKind::Answer]);
    assert_eq!(doc.pages[0].blocks[1].lines.len(), 1);
    assert_eq!(doc.pages[0].blocks[2].text(), "4");

    let footer = doc.pages[0].footer.as_ref().unwrap();
    assert_eq!(footer.label, "Arithmetic");
    assert_eq!(footer.page_number, "1");
}

#[test]
fn overflowing_content_moves_to_second_page() {
    let pairs = long_transcript(20);
    let doc = compose_document("Pagination", &pairs, &default_config()).unwrap();
    assert!(doc.page_count() >= 2, "expected several pages, got {}", doc.page_count());

    let config = default_config();
    for page in doc.pages.iter().skip(1) {
        // The block that triggered the break starts at the top margin.
        let first = &page.blocks[0];
        assert!((first.y - config.page_margin).abs() < 0.01);
    }
}

// =====================================================================
// Pagination properties
// =====================================================================

#[test]
fn blocks_never_straddle_the_bottom_margin() {
    let config = default_config();
    let doc = compose_document("Pagination", &long_transcript(30), &config).unwrap();
    let limit = config.effective_height() - config.page_margin;

    for (page, block) in doc.blocks() {
        assert!(block.y >= config.page_margin - 0.01, "block above top margin on page {page}");
        assert!(
            block.bottom() <= limit + 0.01,
            "block on page {page} ends at {} past limit {limit}",
            block.bottom()
        );
    }
}

#[test]
fn blocks_are_ordered_within_a_page() {
    let doc = compose_document("Order", &long_transcript(12), &default_config()).unwrap();
    for page in &doc.pages {
        for pair in page.blocks.windows(2) {
            assert!(pair[1].y >= pair[0].bottom(), "overlapping blocks on page {}", page.page_index);
        }
    }
}

#[test]
fn every_page_has_exactly_one_footer() {
    let doc = compose_document("Footers", &long_transcript(25), &default_config()).unwrap();
    for (i, page) in doc.pages.iter().enumerate() {
        assert_eq!(page.page_index, i + 1);
        let footer = page.footer.as_ref().expect("missing footer");
        assert_eq!(footer.page_number, (i + 1).to_string());
        assert_eq!(footer.label, "Footers");
    }
}

#[test]
fn question_block_exactly_filling_the_page_does_not_break() {
    // All fonts 12pt with factor 1.0 → 12pt lines and no spacing, on a page
    // with 120pt of usable height.
    let config = ExportConfig {
        page_height: 140.0,
        page_margin: 10.0,
        line_height_factor: 1.0,
        block_spacing: 0.0,
        title_spacing: 0.0,
        pair_spacing: 0.0,
        title_font_size: 12.0,
        answer_font_size: 12.0,
        ..default_config()
    };
    // usable height 120: title (12) + 4 × (question 12 + answer 12) = 108,
    // then one more question of 12 lands exactly on the limit.
    let mut pairs: Vec<QaPair> = (0..4).map(|i| QaPair::new(format!("q{i}"), "a")).collect();
    pairs.push(QaPair::new("last", "z"));
    let doc = compose_document("T", &pairs, &config).unwrap();

    let last_question = doc
        .blocks()
        .filter(|(_, b)| b.kind == BlockKind::Question)
        .last()
        .unwrap();
    assert_eq!(last_question.0, 1, "exact fit must stay on page 1");
    assert!((last_question.1.bottom() - 130.0).abs() < 0.001);

    // Its answer is one unit too many and starts page 2.
    let (page, answer) = doc.blocks().last().unwrap();
    assert_eq!(page, 2);
    assert_eq!(answer.text(), "z");
    assert_eq!(doc.page_count(), 2);
}

#[test]
fn oversized_answer_overflows_by_default_and_can_be_rejected() {
    let huge = "word ".repeat(20_000);
    let pairs = vec![QaPair::new("q", huge.trim())];

    let doc = compose_document("Big", &pairs, &default_config()).unwrap();
    let (page, block) = doc.blocks().find(|(_, b)| b.kind == BlockKind::Answer).unwrap();
    assert_eq!(page, 2);
    assert!(block.height > default_config().usable_height());
    assert!(doc.pages.iter().all(|p| p.footer.is_some()));

    let strict = ExportConfig {
        oversize_policy: OversizePolicy::Reject,
        ..default_config()
    };
    assert!(matches!(
        compose_document("Big", &pairs, &strict),
        Err(ExportError::BlockTooLarge { .. })
    ));
}

// =====================================================================
// Determinism
// =====================================================================

#[test]
fn composition_is_idempotent() {
    let pairs = long_transcript(15);
    let a = compose_document("Same", &pairs, &default_config()).unwrap();
    let b = compose_document("Same", &pairs, &default_config()).unwrap();
    assert_eq!(a.page_count(), b.page_count());
    assert_eq!(a, b);
    assert_eq!(layout_hash(&a), layout_hash(&b));
}

#[test]
fn document_json_roundtrip() {
    let doc = compose_document("Round", &long_transcript(3), &default_config()).unwrap();
    let parsed = Document::from_json(&doc.to_json().unwrap()).unwrap();
    assert_eq!(doc.page_count(), parsed.page_count());
    let bytes = render_pdf(&parsed).unwrap();
    assert_valid_pdf(&bytes);
}

// =====================================================================
// Errors
// =====================================================================

#[test]
fn empty_transcript_is_rejected() {
    assert!(matches!(
        export_pdf("T", &[], &default_config()),
        Err(ExportError::EmptyTranscript)
    ));
}

// =====================================================================
// PDF output
// =====================================================================

#[test]
fn export_produces_valid_pdf() {
    let (bytes, doc) = export_pdf("Report", &long_transcript(10), &default_config()).unwrap();
    assert_valid_pdf(&bytes);
    assert!(doc.page_count() >= 1);
}

#[test]
fn landscape_export_uses_swapped_dimensions() {
    let (bytes, doc) = export_pdf("Wide", &long_transcript(2), &ExportConfig::a4_landscape()).unwrap();
    assert_valid_pdf(&bytes);
    assert!(doc.page_width_pt > doc.page_height_pt);
}

#[test]
fn file_sink_names_output_after_title() {
    let dir = std::env::temp_dir().join(format!("qa-press-test-{}", std::process::id()));
    let doc = compose_document("What is 2+2?", &[QaPair::new("What is 2+2?", "4")], &default_config())
        .unwrap();
    let path = PdfFileSink::new(&dir).write(&doc).unwrap();
    assert_eq!(path.file_name().unwrap(), "what_is_2_2_.pdf");
    let bytes = std::fs::read(&path).unwrap();
    assert_valid_pdf(&bytes);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn transcript_file_drives_title() {
    let t = Transcript::from_json(
        r#"[{"question":"Explain photosynthesis in plants and algae please","answer":"Light..."}]"#,
    )
    .unwrap();
    let title = t.resolved_title();
    assert_eq!(title, "Explain photosynthesis in plants and alg...");
    let doc = compose_document(&title, &t.pairs, &default_config()).unwrap();
    assert_eq!(doc.pages[0].blocks[0].kind, BlockKind::Title);
}
