//! DOCX package access
//!
//! A DOCX file is a ZIP package; the body lives in `word/document.xml`.
//! Paragraph text follows Word's own reading: runs contribute their `w:t`
//! text, `w:tab` reads as a tab and `w:br`/`w:cr` as a line break. Nested
//! paragraphs (text boxes) are separate paragraphs, never part of their
//! host's text. Markup-compatibility fallbacks are skipped: Word writes a
//! text box twice, as `mc:Choice` and as a legacy `mc:Fallback` copy, and
//! shows only one of them.

pub mod xml;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

pub use xml::XmlNode;

/// Main document part inside the package
pub const DOCUMENT_PART: &str = "word/document.xml";

pub const PARAGRAPH: &str = "w:p";
pub const RUN: &str = "w:r";
pub const RUN_PROPERTIES: &str = "w:rPr";

/// Legacy duplicate of the `mc:Choice` content next to it
pub const FALLBACK: &str = "mc:Fallback";

/// One piece of run content, in document order
#[derive(Debug, Clone)]
pub enum RunPiece {
    /// Text of a `w:t` element
    Text(String),
    /// A node that reads as a single character (`w:tab`, `w:br`, `w:cr`)
    Char { node: XmlNode, ch: char },
    /// Zero-width content that can travel with any split of the run
    Marker(XmlNode),
}

impl RunPiece {
    fn len(&self) -> usize {
        match self {
            RunPiece::Text(text) => text.len(),
            RunPiece::Char { ch, .. } => ch.len_utf8(),
            RunPiece::Marker(_) => 0,
        }
    }
}

/// Decomposed `w:r` element
#[derive(Debug, Clone)]
pub struct RunContent {
    pub properties: Option<XmlNode>,
    pub pieces: Vec<RunPiece>,
    /// False when the run holds anything besides text (drawings, fields, ...)
    pub simple: bool,
}

impl RunContent {
    pub fn from_run(run: &XmlNode) -> Self {
        let mut content = RunContent {
            properties: None,
            pieces: Vec::new(),
            simple: true,
        };

        for child in run.children() {
            let piece = match child.name() {
                Some(b"w:rPr") => {
                    content.properties = Some(child.clone());
                    continue;
                }
                Some(b"w:t") => RunPiece::Text(child.text()),
                Some(b"w:tab") => RunPiece::Char {
                    node: child.clone(),
                    ch: '\t',
                },
                Some(b"w:br") | Some(b"w:cr") => RunPiece::Char {
                    node: child.clone(),
                    ch: '\n',
                },
                Some(b"w:lastRenderedPageBreak") | Some(b"w:proofErr") => {
                    RunPiece::Marker(child.clone())
                }
                Some(_) => {
                    content.simple = false;
                    continue;
                }
                None => continue,
            };
            content.pieces.push(piece);
        }

        content
    }

    pub fn text(&self) -> String {
        let mut text = String::new();
        for piece in &self.pieces {
            match piece {
                RunPiece::Text(t) => text.push_str(t),
                RunPiece::Char { ch, .. } => text.push(*ch),
                RunPiece::Marker(_) => {}
            }
        }
        text
    }

    pub fn len(&self) -> usize {
        self.pieces.iter().map(RunPiece::len).sum()
    }
}

fn push_paragraph_text(nodes: &[XmlNode], text: &mut String) {
    for node in nodes {
        match node.name() {
            Some(b"w:r") => text.push_str(&RunContent::from_run(node).text()),
            Some(b"w:p") | Some(b"mc:Fallback") => {}
            Some(_) => push_paragraph_text(node.children(), text),
            None => {}
        }
    }
}

/// Text of a paragraph's own runs, given the paragraph's children
pub fn paragraph_text(children: &[XmlNode]) -> String {
    let mut text = String::new();
    push_paragraph_text(children, &mut text);
    text
}

/// Texts of every paragraph in document order (nested ones after their host)
pub fn collect_paragraphs(nodes: &[XmlNode], out: &mut Vec<String>) {
    for node in nodes {
        if node.is(FALLBACK) {
            continue;
        }
        if node.is(PARAGRAPH) {
            out.push(paragraph_text(node.children()));
        }
        collect_paragraphs(node.children(), out);
    }
}

/// Read the main document part of a package
pub fn read_document_xml(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open DOCX: {}", path.display()))?;
    let mut archive = ZipArchive::new(file).context("Not a ZIP package")?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .with_context(|| format!("Package has no {DOCUMENT_PART}"))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .with_context(|| format!("Failed to read {DOCUMENT_PART}"))?;
    Ok(xml)
}

/// Extract all paragraph texts joined by newlines
pub fn extract_text(path: &Path) -> Result<String> {
    let xml = read_document_xml(path)?;
    let nodes = xml::parse(&xml)?;

    let mut paragraphs = Vec::new();
    collect_paragraphs(&nodes, &mut paragraphs);
    Ok(paragraphs.join("\n"))
}
