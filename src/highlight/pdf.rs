//! PDF highlighting: one `/Highlight` annotation per matched line segment
//!
//! Rectangles come from the same page layout used for extraction. Each
//! annotation carries QuadPoints and its own appearance stream (a yellow
//! fill under a multiply blend) so viewers that do not synthesise
//! appearances still show it.

use anyhow::{Context, Result};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::fs::File;
use std::path::Path;

use super::Highlighter;
use crate::config::MatchCase;
use crate::counter::find_matches;
use crate::loader::DocumentFormat;
use crate::pdf::{layout_document, Rect};

const HIGHLIGHT_RGB: [f32; 3] = [1.0, 1.0, 0.0];

pub struct PdfHighlighter {
    case: MatchCase,
}

impl PdfHighlighter {
    pub fn new(case: MatchCase) -> Self {
        Self { case }
    }

    /// Locate keyword rectangles on every page, keyed by page object
    pub fn locate(&self, doc: &Document, keyword: &str) -> Result<Vec<(ObjectId, Vec<Rect>)>> {
        let layouts = layout_document(doc)?;
        let mut located = Vec::new();

        for (page_number, page_id) in doc.get_pages() {
            let Some(layout) = layouts.get(&page_number) else {
                continue;
            };

            let rects: Vec<Rect> = find_matches(&layout.text, keyword, self.case)
                .into_iter()
                .flat_map(|range| layout.match_rects(range))
                .collect();

            if !rects.is_empty() {
                tracing::debug!(
                    "Found {} instance(s) of {:?} on page {}",
                    rects.len(),
                    keyword,
                    page_number
                );
                located.push((page_id, rects));
            }
        }

        Ok(located)
    }
}

fn real(v: f32) -> Object {
    Object::Real(v)
}

fn color() -> Object {
    Object::Array(HIGHLIGHT_RGB.iter().map(|c| real(*c)).collect())
}

/// Form XObject that paints the highlight for `rect`
fn appearance_stream(rect: &Rect) -> Stream {
    let [r, g, b] = HIGHLIGHT_RGB;
    let content = format!(
        "q /GS0 gs {r} {g} {b} rg {} {} {} {} re f Q",
        rect.x0,
        rect.y0,
        rect.x1 - rect.x0,
        rect.y1 - rect.y0
    );

    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![real(rect.x0), real(rect.y0), real(rect.x1), real(rect.y1)],
            "Resources" => dictionary! {
                "ExtGState" => dictionary! {
                    "GS0" => dictionary! {
                        "Type" => "ExtGState",
                        "BM" => "Multiply",
                    },
                },
            },
        },
        content.into_bytes(),
    )
}

fn annotation(doc: &mut Document, page_id: ObjectId, rect: &Rect, keyword: &str) -> ObjectId {
    let appearance_id = doc.add_object(appearance_stream(rect));

    doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Highlight",
        "Rect" => vec![real(rect.x0), real(rect.y0), real(rect.x1), real(rect.y1)],
        "QuadPoints" => vec![
            real(rect.x0), real(rect.y1),
            real(rect.x1), real(rect.y1),
            real(rect.x0), real(rect.y0),
            real(rect.x1), real(rect.y0),
        ],
        "C" => color(),
        "F" => 4,
        "P" => page_id,
        "Contents" => Object::string_literal(keyword),
        "AP" => dictionary! {
            "N" => appearance_id,
        },
    })
}

/// Append annotation references to a page's `/Annots`
fn attach_annotations(doc: &mut Document, page_id: ObjectId, annots: Vec<Object>) -> Result<()> {
    let existing = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .context("Page is not a dictionary")?
        .get(b"Annots")
        .ok()
        .cloned();

    match existing {
        Some(Object::Reference(array_id)) => {
            doc.get_object_mut(array_id)
                .and_then(Object::as_array_mut)
                .context("Page /Annots does not reference an array")?
                .extend(annots);
        }
        Some(Object::Array(mut current)) => {
            current.extend(annots);
            set_annots(doc, page_id, current)?;
        }
        _ => set_annots(doc, page_id, annots)?,
    }

    Ok(())
}

fn set_annots(doc: &mut Document, page_id: ObjectId, annots: Vec<Object>) -> Result<()> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .context("Page is not a dictionary")?
        .set("Annots", Object::Array(annots));
    Ok(())
}

impl Highlighter for PdfHighlighter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn render(&self, source: &Path, keyword: &str, out: &mut File) -> Result<usize> {
        let mut doc = Document::load(source)
            .with_context(|| format!("Failed to open PDF: {}", source.display()))?;

        let located = self.locate(&doc, keyword)?;
        let mut marks = 0;

        for (page_id, rects) in located {
            let annots: Vec<Object> = rects
                .iter()
                .map(|rect| Object::Reference(annotation(&mut doc, page_id, rect, keyword)))
                .collect();
            marks += annots.len();
            attach_annotations(&mut doc, page_id, annots)?;
        }

        doc.prune_objects();
        doc.delete_zero_length_streams();
        doc.renumber_objects();
        doc.compress();
        doc.save_to(out).context("Failed to write highlighted PDF")?;

        Ok(marks)
    }
}
