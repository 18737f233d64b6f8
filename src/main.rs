//! qa-press – command-line transcript → PDF exporter.
//!
//! Usage:
//!   qa-press <transcript.json> [output.pdf] [--title "Biology"] [--config layout.json]
//!
//! If `output.pdf` is omitted the PDF is written to the current directory,
//! named after the document title (e.g. "What is 2+2?" → `what_is_2_2_.pdf`).

use std::{env, fs, path::PathBuf, process};

use qa_press::flow::OversizePolicy;
use qa_press::fonts::{FontManager, DEFAULT_FAMILY};
use qa_press::pipeline::{compose_document_with_fonts, ExportConfig, PageOrientation};
use qa_press::render::{write_pdf, DocumentSink, PdfFileSink};
use qa_press::transcript::Transcript;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut metrics_regular: Option<PathBuf> = None;
    let mut metrics_bold: Option<PathBuf> = None;
    let mut title: Option<String> = None;
    let mut landscape = false;
    let mut reject_oversize = false;
    let mut dump_layout = false;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--landscape" | "-l" => landscape = true,
            "--reject-oversize" => reject_oversize = true,
            "--dump-layout" => dump_layout = true,
            "--title" | "-t" => title = Some(required_value(&mut iter, arg, &args[0])),
            "--config" | "-c" => {
                config_path = Some(PathBuf::from(required_value(&mut iter, arg, &args[0])))
            }
            "--metrics-font" => {
                metrics_regular = Some(PathBuf::from(required_value(&mut iter, arg, &args[0])))
            }
            "--metrics-font-bold" => {
                metrics_bold = Some(PathBuf::from(required_value(&mut iter, arg, &args[0])))
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no transcript file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let transcript = match fs::read_to_string(&input)
        .map_err(|e| e.to_string())
        .and_then(|s| Transcript::from_json(&s).map_err(|e| e.to_string()))
    {
        Ok(t) => t,
        Err(e) => fail(&format!("Error reading '{}': {e}", input.display())),
    };

    let mut config = match &config_path {
        Some(path) => match fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|s| ExportConfig::from_json(&s).map_err(|e| e.to_string()))
        {
            Ok(c) => c,
            Err(e) => fail(&format!("Error reading config '{}': {e}", path.display())),
        },
        None => ExportConfig::default(),
    };
    if landscape {
        config.orientation = PageOrientation::Landscape;
    }
    if reject_oversize {
        config.oversize_policy = OversizePolicy::Reject;
    }

    let mut fonts = FontManager::default();
    for (path, bold) in [(&metrics_regular, false), (&metrics_bold, true)] {
        let Some(path) = path else { continue };
        let loaded = fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                fonts
                    .load_font(DEFAULT_FAMILY, bold, false, bytes)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = loaded {
            fail(&format!("Error loading font '{}': {e}", path.display()));
        }
    }

    let title = title.unwrap_or_else(|| transcript.resolved_title());
    let document = match compose_document_with_fonts(&title, &transcript.pairs, &config, &fonts) {
        Ok(d) => d,
        Err(e) => fail(&format!("Error composing document: {e}")),
    };

    if dump_layout {
        match document.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => fail(&format!("Error serialising layout: {e}")),
        }
    }

    let written = match output_path {
        Some(path) => write_pdf(&document, &path).map(|_| path),
        None => PdfFileSink::new(".").write(&document),
    };
    match written {
        Ok(path) => {
            let pages = document.page_count();
            eprintln!(
                "Wrote '{}' ({} page{})",
                path.display(),
                pages,
                if pages == 1 { "" } else { "s" }
            );
        }
        Err(e) => fail(&format!("Error writing PDF: {e}")),
    }
}

fn required_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str, prog: &str) -> String {
    match iter.next() {
        Some(v) => v.clone(),
        None => {
            eprintln!("Flag {flag} needs a value");
            print_usage(prog);
            process::exit(1);
        }
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("{msg}");
    process::exit(1);
}

fn print_usage(prog: &str) {
    eprintln!("qa-press – question/answer transcript to PDF exporter");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <transcript.json> [output.pdf] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <transcript.json>  [{{\"question\":..,\"answer\":..}}] or {{\"title\":..,\"pairs\":[..]}}");
    eprintln!("  [output.pdf]       Output path (default: derived from the title, in the current directory)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --title, -t          Document title (default: transcript title or first question)");
    eprintln!("  --config, -c         JSON file overriding layout constants");
    eprintln!("  --landscape, -l      Use landscape page orientation");
    eprintln!("  --reject-oversize    Fail instead of overflowing blocks taller than a page");
    eprintln!("  --metrics-font       TTF used to measure regular text");
    eprintln!("  --metrics-font-bold  TTF used to measure bold text");
    eprintln!("  --dump-layout        Print the composed layout as JSON to stdout");
    eprintln!("  --help               Print this message");
}
