//! Minimal paginated text PDFs.
//!
//! Everything is set in Helvetica on A4 pages. Lines are laid out top-down
//! at a fixed pitch and a new page starts when the cursor drops below the
//! bottom margin.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const LEFT_MARGIN: f32 = 40.0;
const BOTTOM_MARGIN: f32 = 60.0;
const LINE_PITCH: f32 = 16.0;
const FONT_NAME: &str = "F1";

#[derive(Debug, Error)]
#[error("PDF rendering failed: {0}")]
pub struct PdfError(String);

/// Accumulates text lines into pages.
pub struct TextPdf {
    top: f32,
    y: f32,
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
}

impl TextPdf {
    /// Start a document whose lines begin at `top` on every page.
    pub fn new(top: f32) -> Self {
        Self {
            top,
            y: top,
            pages: Vec::new(),
            current: Vec::new(),
        }
    }

    /// Draw `text` at an absolute position without moving the cursor.
    pub fn text_at(&mut self, x: f32, y: f32, size: f32, text: &str) {
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_NAME.into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(encode_text(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Draw `text` at the cursor and advance one line.
    pub fn line(&mut self, text: &str, size: f32) {
        self.indented_line(0.0, text, size);
    }

    pub fn indented_line(&mut self, indent: f32, text: &str, size: f32) {
        let y = self.y;
        self.text_at(LEFT_MARGIN + indent, y, size, text);
        self.advance(LINE_PITCH);
    }

    /// Move the cursor down without drawing.
    pub fn advance(&mut self, amount: f32) {
        self.y -= amount;
        if self.y < BOTTOM_MARGIN {
            self.new_page();
        }
    }

    pub fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = self.top;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len() + usize::from(!self.current.is_empty())
    }

    /// Serialize to PDF bytes.
    pub fn finish(mut self) -> Result<Vec<u8>, PdfError> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { FONT_NAME => font_id },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let page_id = add_page(&mut doc, pages_id, operations)?;
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| PdfError(e.to_string()))?;
        Ok(bytes)
    }
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<ObjectId, PdfError> {
    let content = Content { operations };
    let encoded = content.encode().map_err(|e| PdfError(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

/// Map text onto the single-byte font encoding. Characters outside Latin-1
/// become `?`.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            0x20..=0x7e | 0xa0..=0xff => c as u8,
            _ => b'?',
        })
        .collect()
}

/// First `max` characters of `text`.
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page_document() {
        let mut pdf = TextPdf::new(800.0);
        pdf.line("Claim Verification Report", 16.0);
        assert_eq!(pdf.page_count(), 1);

        let bytes = pdf.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_paginates_below_margin() {
        let mut pdf = TextPdf::new(800.0);
        // Lines are drawn at 800, 784, ... 64: 47 fit on a page.
        for i in 0..47 {
            pdf.line(&format!("line {}", i), 9.0);
        }
        assert_eq!(pdf.page_count(), 1);
        for i in 47..48 {
            pdf.line(&format!("line {}", i), 9.0);
        }
        assert_eq!(pdf.page_count(), 2);

        let doc = Document::load_mem(&pdf.finish().unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_empty_document_has_one_page() {
        let doc = Document::load_mem(&TextPdf::new(800.0).finish().unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_encode_and_truncate() {
        assert_eq!(encode_text("Café ✓"), b"Caf\xe9 ?".to_vec());
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
    }
}
