//! Page layout primitives.
//!
//! [`Cursor`] owns the document being built and the current vertical
//! position. Drawing helpers advance it; [`Cursor::ensure`] is the only
//! place a page break happens, so section renderers never track pages
//! themselves. The footer pass in [`Cursor::finish`] runs after all
//! content exists, when the total page count is known.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerIndex, PdfLayerReference, PdfPageIndex, Point, Rect,
};
use serde_json::Value;

use gitsentry_core::error::{GitsentryError, RenderError};

/// A4 portrait.
pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
/// Uniform page margin, mm.
pub const MARGIN: f32 = 20.0;
/// Lowest y content may occupy; below this lives the footer.
const BOTTOM_LIMIT: f32 = 25.0;
/// Points-to-millimetres conversion.
const PT_TO_MM: f32 = 0.352_778;

fn mm(v: f32) -> Mm {
    Mm(v as _)
}

/// Font faces used by the document.
#[derive(Debug, Clone, Copy)]
pub enum Face {
    Regular,
    Bold,
    Oblique,
}

/// Layout cursor: current page, current y, fonts, page list.
pub struct Cursor {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    y: f32,
}

impl Cursor {
    /// Start a document with one empty page.
    pub fn new(title: &str) -> Result<Self, GitsentryError> {
        let (doc, page, layer) = PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "content");
        let font = |f: BuiltinFont| {
            doc.add_builtin_font(f).map_err(|e| {
                GitsentryError::Render(RenderError::Font {
                    reason: e.to_string(),
                })
            })
        };
        let regular = font(BuiltinFont::Helvetica)?;
        let bold = font(BuiltinFont::HelveticaBold)?;
        let oblique = font(BuiltinFont::HelveticaOblique)?;
        Ok(Self {
            doc,
            regular,
            bold,
            oblique,
            pages: vec![(page, layer)],
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn font(&self, face: Face) -> &IndirectFontRef {
        match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
            Face::Oblique => &self.oblique,
        }
    }

    fn layer(&self) -> PdfLayerReference {
        let (page, layer) = self.pages[self.pages.len() - 1];
        self.doc.get_page(page).get_layer(layer)
    }

    /// Vertical space one line of `size` pt text occupies, mm.
    pub fn line_height(size: f32) -> f32 {
        size * PT_TO_MM * 1.45
    }

    /// Break to a fresh page.
    pub fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "content");
        self.pages.push((page, layer));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Guarantee `needed` mm of vertical space on the current page.
    /// Returns `true` when a page break was taken, so table renderers
    /// can reprint their column headers on the fresh page.
    pub fn ensure(&mut self, needed: f32) -> bool {
        if self.y - needed < BOTTOM_LIMIT {
            self.new_page();
            return true;
        }
        false
    }

    /// Move down by `dy` mm.
    pub fn advance(&mut self, dy: f32) {
        self.y -= dy;
    }

    /// Draw one line of text at the left margin and advance past it.
    pub fn text(&mut self, text: &str, size: f32, face: Face, color: &Color) {
        let height = Self::line_height(size);
        self.ensure(height);
        self.advance(height);
        let layer = self.layer();
        layer.set_fill_color(color.clone());
        layer.use_text(text, size as _, mm(MARGIN), mm(self.y), self.font(face));
    }

    /// Draw text at an x offset from the left margin without advancing.
    /// Used for table columns; the caller advances once per row.
    pub fn text_at(&self, offset: f32, text: &str, size: f32, face: Face, color: &Color) {
        let layer = self.layer();
        layer.set_fill_color(color.clone());
        layer.use_text(text, size as _, mm(MARGIN + offset), mm(self.y), self.font(face));
    }

    /// Horizontal rule across the content width.
    pub fn rule(&mut self, color: &Color) {
        self.ensure(4.0);
        self.advance(2.0);
        let layer = self.layer();
        layer.set_outline_color(color.clone());
        layer.set_outline_thickness(0.5);
        layer.add_line(Line {
            points: vec![
                (Point::new(mm(MARGIN), mm(self.y)), false),
                (Point::new(mm(PAGE_WIDTH - MARGIN), mm(self.y)), false),
            ],
            is_closed: false,
        });
        self.advance(2.0);
    }

    /// Full-width filled banner with white text.
    pub fn banner(&mut self, text: &str, fill: &Color) {
        const HEIGHT: f32 = 10.0;
        self.ensure(HEIGHT + 2.0);
        self.advance(HEIGHT);
        let layer = self.layer();
        layer.set_fill_color(fill.clone());
        layer.add_rect(
            Rect::new(
                mm(MARGIN),
                mm(self.y - 2.0),
                mm(PAGE_WIDTH - MARGIN),
                mm(self.y + HEIGHT - 2.0),
            )
            .with_mode(PaintMode::Fill),
        );
        layer.set_fill_color(Color::Rgb(printpdf::Rgb::new(
            1.0 as _, 1.0 as _, 1.0 as _, None,
        )));
        layer.use_text(text, 12.0 as _, mm(MARGIN + 3.0), mm(self.y + 1.0), &self.bold);
        self.advance(4.0);
    }

    /// Blank vertical gap.
    pub fn gap(&mut self, dy: f32) {
        self.ensure(dy);
        self.advance(dy);
    }

    /// Pages built so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Stamp footers on every page and serialize the document.
    ///
    /// Footers carry the total page count, so they can only be drawn
    /// once all content pages exist.
    pub fn finish(self, footer_left: &str, muted: &Color) -> Result<Vec<u8>, GitsentryError> {
        let total = self.pages.len();
        for (number, (page, layer)) in self.pages.iter().enumerate() {
            let layer = self.doc.get_page(*page).get_layer(*layer);
            layer.set_fill_color(muted.clone());
            layer.use_text(
                format!("{footer_left} | Page {} of {total}", number + 1),
                8.0 as _,
                mm(MARGIN),
                mm(12.0),
                &self.regular,
            );
        }
        self.doc.save_to_bytes().map_err(|e| {
            GitsentryError::Render(RenderError::Pdf {
                reason: e.to_string(),
            })
        })
    }
}

/// Truncate on a char boundary, appending "..." when anything was cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

/// Format a CVSS score value: numbers and numeric strings render with
/// one decimal, anything else renders as "N/A".
pub fn format_cvss(score: &Value) -> String {
    let parsed = score
        .as_f64()
        .or_else(|| score.as_str().and_then(|s| s.trim().parse::<f64>().ok()));
    match parsed {
        Some(n) if n.is_finite() => format!("{n:.1}"),
        _ => "N/A".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truncate_keeps_short_text_intact() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("", 10), "");
    }

    #[test]
    fn truncate_cuts_on_char_boundaries() {
        assert_eq!(truncate("abcdefgh", 5), "abcde...");
        // Multi-byte chars must not be split.
        assert_eq!(truncate("héllö wörld", 4), "héll...");
    }

    #[test]
    fn cvss_numbers_render_one_decimal() {
        assert_eq!(format_cvss(&json!(9.8)), "9.8");
        assert_eq!(format_cvss(&json!(10)), "10.0");
        assert_eq!(format_cvss(&json!(5)), "5.0");
        // Scanners sometimes report scores as strings.
        assert_eq!(format_cvss(&json!("7.8")), "7.8");
    }

    #[test]
    fn cvss_non_numbers_render_na() {
        assert_eq!(format_cvss(&json!("N/A")), "N/A");
        assert_eq!(format_cvss(&json!(null)), "N/A");
        assert_eq!(format_cvss(&json!("unknown")), "N/A");
    }

    #[test]
    fn ensure_breaks_page_when_space_runs_out() {
        let mut cursor = Cursor::new("test").expect("cursor");
        assert_eq!(cursor.page_count(), 1);
        // Consume most of the page, then request more than remains.
        cursor.advance(PAGE_HEIGHT - MARGIN - 30.0);
        assert!(cursor.ensure(20.0));
        assert_eq!(cursor.page_count(), 2);
        assert!(!cursor.ensure(20.0));
    }

    #[test]
    fn finish_produces_a_pdf() {
        let mut cursor = Cursor::new("test").expect("cursor");
        let theme = crate::theme::Theme::default();
        cursor.text("hello", 12.0, Face::Regular, &theme.text);
        let bytes = cursor.finish("Generated", &theme.low).expect("finish");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
