//! Page drawing surface used by the document layouts.
//!
//! Coordinates are millimetres from the top-left corner of an A4 page, with
//! `y` growing downwards and text positioned by its baseline. `PdfCanvas`
//! converts them to printpdf's bottom-left origin.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color as PdfColor, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerIndex, PdfLayerReference, PdfPageIndex, Point, Rect, Rgb,
};
use std::io::BufWriter;

use super::RenderError;

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 15.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
/// Lowest baseline content may use before a page break.
pub const CONTENT_BOTTOM: f32 = PAGE_HEIGHT - 25.0;

const PT_TO_MM: f32 = 0.3528;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const BLACK: Color = Color(20, 20, 20);
    pub const MUTED: Color = Color(110, 110, 110);
    pub const BORDER: Color = Color(200, 200, 200);
    pub const ROW_SHADE: Color = Color(245, 245, 245);
    pub const HEADER_FILL: Color = Color(230, 236, 245);
    pub const BRAND: Color = Color(30, 64, 120);
    pub const RUSH_RED: Color = Color(200, 30, 30);
    pub const BANNER_YELLOW: Color = Color(255, 214, 10);
    pub const NOTE_YELLOW: Color = Color(255, 249, 219);
    pub const WHITE: Color = Color(255, 255, 255);

    fn to_pdf(self) -> PdfColor {
        PdfColor::Rgb(Rgb::new(
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
            None,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
    pub color: Color,
    pub align: Align,
}

impl TextStyle {
    pub fn new(size: f32) -> Self {
        Self {
            size,
            bold: false,
            color: Color::BLACK,
            align: Align::Left,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Fill(Color),
    Stroke(Color),
    FillStroke { fill: Color, stroke: Color },
}

/// Approximate rendered width in mm for the built-in Helvetica faces.
pub fn text_width(text: &str, style: &TextStyle) -> f32 {
    let em = if style.bold { 0.56 } else { 0.52 };
    text.chars().count() as f32 * style.size * em * PT_TO_MM
}

/// Line height in mm for a given font size.
pub fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * 1.35
}

/// Left edge of `text` when anchored at `x` with the style's alignment.
pub fn aligned_x(text: &str, x: f32, style: &TextStyle) -> f32 {
    match style.align {
        Align::Left => x,
        Align::Center => x - text_width(text, style) / 2.0,
        Align::Right => x - text_width(text, style),
    }
}

pub trait Canvas {
    fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle);

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Color, width: f32);

    /// Rectangle with its top-left corner at `(x, y)`.
    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, paint: Paint);

    /// Append a page and make it current.
    fn new_page(&mut self);

    /// Switch drawing to an existing page (zero-based).
    fn set_page(&mut self, index: usize);

    fn page_count(&self) -> usize;

    fn horizontal_rule(&mut self, y: f32, color: Color) {
        self.line((MARGIN, y), (PAGE_WIDTH - MARGIN, y), color, 0.3);
    }

    /// Empty square, used for pick and checklist boxes.
    fn checkbox(&mut self, x: f32, y: f32, size: f32) {
        self.rect(x, y, size, size, Paint::Stroke(Color::BLACK));
    }
}

pub struct PdfCanvas {
    doc: PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PdfCanvas {
    pub fn new(title: &str) -> Result<Self, RenderError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let current = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            pages: vec![(page, layer)],
            layer: current,
            regular,
            bold,
        })
    }

    pub fn finish(self) -> Result<Vec<u8>, RenderError> {
        let mut writer = BufWriter::new(Vec::<u8>::new());
        self.doc
            .save(&mut writer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| RenderError::Pdf(e.to_string()))
    }

    fn point(x: f32, y: f32) -> Point {
        Point::new(Mm(x), Mm(PAGE_HEIGHT - y))
    }
}

impl Canvas for PdfCanvas {
    fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        let left = aligned_x(text, x, &style);
        let font = if style.bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(style.color.to_pdf());
        self.layer
            .use_text(text, style.size, Mm(left), Mm(PAGE_HEIGHT - y), font);
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Color, width: f32) {
        self.layer.set_outline_color(color.to_pdf());
        self.layer.set_outline_thickness(width / PT_TO_MM);
        self.layer.add_line(Line {
            points: vec![
                (Self::point(from.0, from.1), false),
                (Self::point(to.0, to.1), false),
            ],
            is_closed: false,
        });
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, paint: Paint) {
        let mode = match paint {
            Paint::Fill(fill) => {
                self.layer.set_fill_color(fill.to_pdf());
                PaintMode::Fill
            }
            Paint::Stroke(stroke) => {
                self.layer.set_outline_color(stroke.to_pdf());
                self.layer.set_outline_thickness(0.8);
                PaintMode::Stroke
            }
            Paint::FillStroke { fill, stroke } => {
                self.layer.set_fill_color(fill.to_pdf());
                self.layer.set_outline_color(stroke.to_pdf());
                self.layer.set_outline_thickness(0.8);
                PaintMode::FillStroke
            }
        };
        let rect = Rect::new(
            Mm(x),
            Mm(PAGE_HEIGHT - (y + height)),
            Mm(x + width),
            Mm(PAGE_HEIGHT - y),
        )
        .with_mode(mode);
        self.layer.add_rect(rect);
    }

    fn new_page(&mut self) {
        let label = format!("Page {}", self.pages.len() + 1);
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), label);
        self.pages.push((page, layer));
        self.layer = self.doc.get_page(page).get_layer(layer);
    }

    fn set_page(&mut self, index: usize) {
        if let Some((page, layer)) = self.pages.get(index).copied() {
            self.layer = self.doc.get_page(page).get_layer(layer);
        }
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }
}
