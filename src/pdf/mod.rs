//! PDF access built on lopdf and pdf-extract
//!
//! pdf-extract interprets page content and decodes every glyph (ToUnicode
//! maps, `/Differences` encodings, CID fonts); a layout device turns the
//! decoded characters into page text and glyph boxes. The same layout
//! drives both text extraction and highlight placement, so a keyword that
//! is counted is a keyword that can be located.

mod layout;

use anyhow::{anyhow, Context, Result};
use lopdf::Document;
use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

pub use layout::{PageLayout, Rect};

use layout::PageBuilder;

/// Output device collecting one layout per page, keyed by page number
#[derive(Default)]
struct LayoutDevice {
    pages: BTreeMap<u32, PageLayout>,
    current: Option<(u32, PageBuilder)>,
}

impl OutputDev for LayoutDevice {
    fn begin_page(
        &mut self,
        page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.current = Some((page_num, PageBuilder::default()));
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        if let Some((page_num, builder)) = self.current.take() {
            self.pages.insert(page_num, builder.finish());
        }
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        text: &str,
    ) -> Result<(), OutputError> {
        if let Some((_, builder)) = self.current.as_mut() {
            let matrix = [
                trm.m11 as f32,
                trm.m12 as f32,
                trm.m21 as f32,
                trm.m22 as f32,
                trm.m31 as f32,
                trm.m32 as f32,
            ];
            builder.push(text, &matrix, width as f32, font_size as f32);
        }
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Lay out the text of every page, keyed by page number
pub fn layout_document(doc: &Document) -> Result<BTreeMap<u32, PageLayout>> {
    let mut device = LayoutDevice::default();

    // pdf-extract can panic on malformed PDFs
    let result = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::output_doc(doc, &mut device)
    }));

    match result {
        Ok(Ok(())) => Ok(device.pages),
        Ok(Err(e)) => Err(anyhow!("PDF layout failed: {e}")),
        Err(_) => Err(anyhow!("PDF layout panicked (malformed PDF)")),
    }
}

/// Extract the text of every page, each page terminated by a newline
pub fn extract_text(path: &Path) -> Result<String> {
    let doc = Document::load(path)
        .with_context(|| format!("Failed to open PDF: {}", path.display()))?;
    let layouts = layout_document(&doc)
        .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))?;

    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        if let Some(layout) = layouts.get(page_number) {
            text.push_str(&layout.text);
        }
        text.push('\n');
    }

    tracing::debug!("PDF extracted: {} chars from {}", text.len(), path.display());
    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, ObjectId, Stream, StringFormat};

    /// Save a document whose font `F1` is `font_id`, one shown string per page
    fn save_pages(mut doc: Document, font_id: ObjectId, shown: Vec<Object>, path: &Path) {
        let pages_id = doc.new_object_id();
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let count = shown.len() as i64;
        let mut kids: Vec<Object> = Vec::new();
        for text in shown {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![text]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();
        doc.save(path).unwrap();
    }

    /// Write a PDF with one Courier text line per page
    pub(crate) fn write_pdf(path: &Path, pages: &[&str]) {
        let mut doc = Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let shown = pages.iter().map(|t| Object::string_literal(*t)).collect();
        save_pages(doc, font_id, shown, path);
    }

    /// Glyph ids of the Type0 fixture font and the text they map to
    const GLYPHS: [(u16, &str); 5] = [
        (0x55, "0072"),
        (0x58, "0075"),
        (0x56, "0073"),
        (0x57, "0074"),
        (0x03, "0020"),
    ];

    fn to_unicode_cmap() -> Vec<u8> {
        let entries: String = GLYPHS
            .iter()
            .map(|(gid, unicode)| format!("<{gid:04X}> <{unicode}>\n"))
            .collect();
        format!(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n\
             <0000> <FFFF>\n\
             endcodespacerange\n\
             {} beginbfchar\n\
             {entries}\
             endbfchar\n\
             endcmap\n\
             CMapName currentdict /CMap defineresource pop\n\
             end\n\
             end\n",
            GLYPHS.len()
        )
        .into_bytes()
    }

    /// Write a PDF drawn with an Identity-H Type0 font, the way Word and
    /// Chrome export subset TrueType fonts; glyph ids only decode through
    /// the font's ToUnicode map. `text` uses the letters of "rust" and
    /// spaces.
    pub(crate) fn write_type0_pdf(path: &Path, text: &str) {
        let mut doc = Document::with_version("1.5");
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => "AAAAAA+Subset",
            "Flags" => 4,
            "FontBBox" => vec![0.into(), (-200).into(), 1000.into(), 800.into()],
            "ItalicAngle" => 0,
            "Ascent" => 800,
            "Descent" => -200,
            "CapHeight" => 700,
            "StemV" => 80,
        });
        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "AAAAAA+Subset",
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => 500,
        });
        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap()));
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "AAAAAA+Subset",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![cid_font_id.into()],
            "ToUnicode" => to_unicode_id,
        });

        let codes: Vec<u8> = text
            .chars()
            .flat_map(|c| {
                let unicode = format!("{:04X}", c as u32);
                let (gid, _) = GLYPHS
                    .iter()
                    .find(|(_, u)| *u == unicode)
                    .expect("character not in fixture font");
                gid.to_be_bytes()
            })
            .collect();
        let shown = Object::String(codes, StringFormat::Hexadecimal);
        save_pages(doc, font_id, vec![shown], path);
    }

    /// Write a PDF whose simple font remaps `A B C D` to `r u s t` through
    /// `/Differences`; the content stream shows `shown` verbatim.
    pub(crate) fn write_differences_pdf(path: &Path, shown: &str) {
        let mut doc = Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => dictionary! {
                "Type" => "Encoding",
                "BaseEncoding" => "WinAnsiEncoding",
                "Differences" => vec![
                    65.into(),
                    "r".into(),
                    "u".into(),
                    "s".into(),
                    "t".into(),
                ],
            },
        });
        save_pages(doc, font_id, vec![Object::string_literal(shown)], path);
    }

    #[test]
    fn test_extract_text_concatenates_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        write_pdf(&path, &["Alpha beta", "Gamma delta"]);

        let text = extract_text(&path).unwrap();
        assert_eq!(text, "Alpha beta\nGamma delta\n");
    }

    #[test]
    fn test_type0_font_decodes_through_to_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.pdf");
        write_type0_pdf(&path, "rust trust");

        assert_eq!(extract_text(&path).unwrap(), "rust trust\n");
    }

    #[test]
    fn test_differences_encoding_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remapped.pdf");
        write_differences_pdf(&path, "ABCD ABCD");

        assert_eq!(extract_text(&path).unwrap(), "rust rust\n");
    }

    #[test]
    fn test_layout_keyed_by_page_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        write_pdf(&path, &["one", "two"]);

        let doc = Document::load(&path).unwrap();
        let layouts = layout_document(&doc).unwrap();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[&1].text, "one");
        assert_eq!(layouts[&2].text, "two");
        assert_eq!(layouts[&2].glyphs.len(), 3);
    }

    #[test]
    fn test_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pdf");
        std::fs::write(&path, b"hello").unwrap();
        assert!(extract_text(&path).is_err());
    }
}
