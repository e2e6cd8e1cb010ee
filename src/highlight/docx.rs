//! DOCX highlighting by run splitting
//!
//! Matches are found in paragraph text exactly as extraction reads it. A
//! plain text run that overlaps a match is split at the match boundaries so
//! only the matched characters carry `w:highlight`; the split runs keep the
//! original run properties. Runs with non-text content are marked whole.

use anyhow::{Context, Result};
use quick_xml::events::BytesStart;
use std::fs::File;
use std::io::Write;
use std::ops::Range;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::Highlighter;
use crate::config::MatchCase;
use crate::counter::find_matches;
use crate::docx::{
    paragraph_text, read_document_xml, xml, RunContent, RunPiece, XmlNode, DOCUMENT_PART,
    FALLBACK, PARAGRAPH, RUN, RUN_PROPERTIES,
};
use crate::loader::DocumentFormat;

const HIGHLIGHT: &str = "w:highlight";

/// `w:rPr` children that must follow `w:highlight`
const AFTER_HIGHLIGHT: &[&[u8]] = &[
    b"w:u",
    b"w:effect",
    b"w:bdr",
    b"w:shd",
    b"w:fitText",
    b"w:vertAlign",
    b"w:rtl",
    b"w:cs",
    b"w:em",
    b"w:lang",
    b"w:eastAsianLayout",
    b"w:specVanish",
    b"w:oMath",
    b"w:rPrChange",
];

pub struct DocxHighlighter {
    color: String,
}

fn overlaps(span: &Range<usize>, matches: &[Range<usize>]) -> bool {
    matches.iter().any(|m| m.start < span.end && span.start < m.end)
}

fn in_match(matches: &[Range<usize>], at: usize) -> bool {
    matches.iter().any(|m| m.contains(&at))
}

/// First match boundary after `at`
fn next_boundary(matches: &[Range<usize>], at: usize) -> usize {
    matches
        .iter()
        .find(|m| m.end > at)
        .map_or(usize::MAX, |m| if m.start <= at { m.end } else { m.start })
}

type Segment = (bool, Vec<RunPiece>);

fn push_piece(segments: &mut Vec<Segment>, marked: bool, piece: RunPiece) {
    match segments.last_mut() {
        Some((last_marked, pieces)) if *last_marked == marked => match (pieces.last_mut(), piece) {
            (Some(RunPiece::Text(prev)), RunPiece::Text(text)) => prev.push_str(&text),
            (_, piece) => pieces.push(piece),
        },
        _ => segments.push((marked, vec![piece])),
    }
}

/// Group run pieces starting at paragraph offset `start` into marked and
/// unmarked stretches, cutting text at match boundaries
fn segments(pieces: Vec<RunPiece>, start: usize, matches: &[Range<usize>]) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    let mut pos = start;

    for piece in pieces {
        match piece {
            RunPiece::Marker(_) => {
                let marked = out.last().map_or_else(|| in_match(matches, pos), |s| s.0);
                push_piece(&mut out, marked, piece);
            }
            RunPiece::Char { ch, .. } => {
                push_piece(&mut out, in_match(matches, pos), piece);
                pos += ch.len_utf8();
            }
            RunPiece::Text(text) => {
                let end = pos + text.len();
                let mut at = pos;
                while at < end {
                    let boundary = next_boundary(matches, at).min(end);
                    push_piece(
                        &mut out,
                        in_match(matches, at),
                        RunPiece::Text(text[at - pos..boundary - pos].to_string()),
                    );
                    at = boundary;
                }
                pos = end;
            }
        }
    }

    out
}

fn text_node(text: String) -> XmlNode {
    let mut start = BytesStart::new("w:t");
    start.push_attribute(("xml:space", "preserve"));
    XmlNode::Element {
        start,
        children: vec![XmlNode::Text(text)],
    }
}

impl DocxHighlighter {
    pub fn new(color: &str) -> Self {
        Self {
            color: color.to_string(),
        }
    }

    /// Copy of `properties` carrying exactly one highlight in schema order
    fn highlighted_properties(&self, properties: Option<&XmlNode>) -> XmlNode {
        let (start, mut children) = match properties {
            Some(XmlNode::Element { start, children }) => (start.clone(), children.clone()),
            Some(XmlNode::Empty(start)) => (start.clone(), Vec::new()),
            _ => (BytesStart::new(RUN_PROPERTIES), Vec::new()),
        };

        children.retain(|c| !c.is(HIGHLIGHT));
        let at = children
            .iter()
            .position(|c| c.name().is_some_and(|n| AFTER_HIGHLIGHT.contains(&n)))
            .unwrap_or(children.len());
        children.insert(at, XmlNode::empty(HIGHLIGHT, &[("w:val", self.color.as_str())]));

        XmlNode::Element { start, children }
    }

    fn highlight_whole_run(&self, run: &mut XmlNode) {
        let Some(children) = run.children_mut() else {
            return;
        };
        match children.iter().position(|c| c.is(RUN_PROPERTIES)) {
            Some(i) => {
                let updated = self.highlighted_properties(Some(&children[i]));
                children[i] = updated;
            }
            None => children.insert(0, self.highlighted_properties(None)),
        }
    }

    /// Replace a plain text run by one run per marked/unmarked stretch
    fn split_run(
        &self,
        mut run: XmlNode,
        content: RunContent,
        span: Range<usize>,
        matches: &[Range<usize>],
    ) -> Vec<XmlNode> {
        if !overlaps(&span, matches) {
            return vec![run];
        }

        let start = match &run {
            XmlNode::Element { start, .. } => Some(start.clone()),
            _ => None,
        };
        let Some(start) = start else {
            return vec![run];
        };
        let segments = segments(content.pieces, span.start, matches);
        if let [(true, _)] = segments.as_slice() {
            self.highlight_whole_run(&mut run);
            return vec![run];
        }

        segments
            .into_iter()
            .map(|(marked, pieces)| {
                let mut children = Vec::with_capacity(pieces.len() + 1);
                if marked {
                    children.push(self.highlighted_properties(content.properties.as_ref()));
                } else if let Some(properties) = &content.properties {
                    children.push(properties.clone());
                }
                children.extend(pieces.into_iter().map(|piece| match piece {
                    RunPiece::Text(text) => text_node(text),
                    RunPiece::Char { node, .. } | RunPiece::Marker(node) => node,
                }));
                XmlNode::Element {
                    start: start.clone(),
                    children,
                }
            })
            .collect()
    }

    /// Rewrite the runs of one paragraph level. `offset` tracks the
    /// position in the paragraph text; returns marks from nested paragraphs.
    fn rewrite_runs(
        &self,
        nodes: &mut Vec<XmlNode>,
        matches: &[Range<usize>],
        offset: &mut usize,
        keyword: &str,
    ) -> usize {
        let mut nested = 0;

        for mut node in std::mem::take(nodes) {
            if node.is(RUN) {
                let content = RunContent::from_run(&node);
                let span = *offset..*offset + content.len();
                *offset = span.end;

                if content.simple {
                    nodes.extend(self.split_run(node, content, span, matches));
                    continue;
                }
                if overlaps(&span, matches) {
                    self.highlight_whole_run(&mut node);
                }
                if let Some(children) = node.children_mut() {
                    nested += self.highlight_tree(children, keyword);
                }
            } else if node.is(PARAGRAPH) {
                nested += self.highlight_paragraph(&mut node, keyword);
            } else if node.is(FALLBACK) {
                // Not part of the paragraph text; kept as written
            } else if let Some(children) = node.children_mut() {
                nested += self.rewrite_runs(children, matches, offset, keyword);
            }
            nodes.push(node);
        }

        nested
    }

    fn highlight_paragraph(&self, paragraph: &mut XmlNode, keyword: &str) -> usize {
        let Some(children) = paragraph.children_mut() else {
            return 0;
        };
        let text = paragraph_text(children);
        let matches = find_matches(&text, keyword, MatchCase::Insensitive);

        let mut offset = 0;
        let nested = self.rewrite_runs(children, &matches, &mut offset, keyword);
        matches.len() + nested
    }

    /// Highlight every paragraph under `nodes`; returns the number of matches
    pub fn highlight_tree(&self, nodes: &mut [XmlNode], keyword: &str) -> usize {
        let mut marks = 0;
        for node in nodes {
            if node.is(FALLBACK) {
                continue;
            }
            if node.is(PARAGRAPH) {
                marks += self.highlight_paragraph(node, keyword);
            } else if let Some(children) = node.children_mut() {
                marks += self.highlight_tree(children, keyword);
            }
        }
        marks
    }
}

impl Highlighter for DocxHighlighter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn render(&self, source: &Path, keyword: &str, out: &mut File) -> Result<usize> {
        let mut nodes = xml::parse(&read_document_xml(source)?)
            .with_context(|| format!("Failed to parse {DOCUMENT_PART}"))?;
        let marks = self.highlight_tree(&mut nodes, keyword);
        let document = xml::write(&nodes)?;

        let file = File::open(source)
            .with_context(|| format!("Failed to open DOCX: {}", source.display()))?;
        let mut archive = ZipArchive::new(file).context("Not a ZIP package")?;
        let mut writer = ZipWriter::new(out);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .with_context(|| format!("Failed to read package entry {index}"))?;

            if entry.name() == DOCUMENT_PART {
                drop(entry);
                writer.start_file(DOCUMENT_PART, options)?;
                writer.write_all(&document)?;
            } else {
                let name = entry.name().to_string();
                writer
                    .raw_copy_file(entry)
                    .with_context(|| format!("Failed to copy {name}"))?;
            }
        }

        writer.finish().context("Failed to finish DOCX package")?;
        Ok(marks)
    }
}
