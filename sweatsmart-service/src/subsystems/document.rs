//! Document surface — the drawing API reports are laid out against
//!
//! Coordinates are millimetres from the top-left corner of the page.
//! [`PdfSurface`] maps them onto `printpdf`, whose origin is bottom-left.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use crate::error::ExportError;

/// A4 portrait
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

const MM_PER_PT: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Bold,
    Italic,
}

/// Single-page drawing target.
pub trait DocumentSurface {
    fn page_width(&self) -> f32;

    fn page_height(&self) -> f32;

    /// Font used by subsequent `text` calls. `size` is in points.
    fn set_font(&mut self, style: FontStyle, size: f32);

    fn text(&mut self, text: &str, x: f32, y: f32) -> Result<(), ExportError>;

    /// Break `text` into lines no wider than `max_width` in the current font.
    fn split_text_to_size(&self, text: &str, max_width: f32) -> Vec<String>;

    /// Serialize the finished document.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, ExportError>;
}

/// Opens a fresh surface per report.
pub trait DocumentFactory: Send + Sync {
    fn create(&self, title: &str) -> Result<Box<dyn DocumentSurface>, ExportError>;
}

/// Creates A4 [`PdfSurface`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfFactory;

impl DocumentFactory for PdfFactory {
    fn create(&self, title: &str) -> Result<Box<dyn DocumentSurface>, ExportError> {
        Ok(Box::new(PdfSurface::a4(title)?))
    }
}

pub struct PdfSurface {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    style: FontStyle,
    size: f32,
}

impl PdfSurface {
    pub fn a4(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);

        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let italic = doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(pdf_error)?;

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            italic,
            style: FontStyle::Normal,
            size: 16.0,
        })
    }

    fn font(&self) -> &IndirectFontRef {
        match self.style {
            FontStyle::Normal => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

impl DocumentSurface for PdfSurface {
    fn page_width(&self) -> f32 {
        A4_WIDTH_MM
    }

    fn page_height(&self) -> f32 {
        A4_HEIGHT_MM
    }

    fn set_font(&mut self, style: FontStyle, size: f32) {
        self.style = style;
        self.size = size;
    }

    fn text(&mut self, text: &str, x: f32, y: f32) -> Result<(), ExportError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ExportError::Document(format!(
                "invalid text position ({x}, {y})"
            )));
        }
        self.layer.use_text(
            text,
            self.size,
            Mm(x),
            Mm(A4_HEIGHT_MM - y),
            self.font(),
        );
        Ok(())
    }

    fn split_text_to_size(&self, text: &str, max_width: f32) -> Vec<String> {
        let size = self.size;
        wrap_text(text, max_width, |s| helvetica_width_mm(s, size))
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, ExportError> {
        self.doc.save_to_bytes().map_err(pdf_error)
    }
}

fn pdf_error(e: printpdf::Error) -> ExportError {
    ExportError::Document(e.to_string())
}

/// Approximate rendered width of `text` in Helvetica at `size` points, in mm.
pub fn helvetica_width_mm(text: &str, size: f32) -> f32 {
    let em: f32 = text.chars().map(glyph_em).sum();
    em * size * MM_PER_PT
}

// Rough Helvetica advance widths, in ems.
fn glyph_em(c: char) -> f32 {
    match c {
        ' ' | 'f' | 't' | 'I' | '.' | ',' | ':' | ';' | '!' | '/' => 0.278,
        'i' | 'j' | 'l' | '\'' | '|' => 0.222,
        'r' | '(' | ')' | '-' => 0.333,
        'm' | 'M' => 0.833,
        'w' | 'W' => 0.75,
        c if c.is_ascii_uppercase() => 0.667,
        _ => 0.556,
    }
}

/// Greedy word wrap. Existing line breaks are kept; a word wider than
/// `max_width` on its own is split between characters.
pub fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };

            if measure(&candidate) <= max_width {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }

            if measure(word) <= max_width {
                line = word.to_string();
                continue;
            }

            for c in word.chars() {
                line.push(c);
                if measure(&line) > max_width && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::take(&mut line));
                    line.push(c);
                }
            }
        }

        lines.push(line);
    }

    lines
}
