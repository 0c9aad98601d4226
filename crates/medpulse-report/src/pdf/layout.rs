//! Flowing page layout on top of `lopdf`.
//!
//! A4 portrait pages, the three standard Helvetica faces, a top-down cursor
//! and automatic page breaks. Text widths are estimated from an average
//! glyph width, which is close enough for wrapping and alignment of
//! Helvetica body text.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use medpulse_common::{MedpulseError, Result};

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 42.0;
/// Lowest baseline body text may use before breaking to a new page.
const BOTTOM_LIMIT: f32 = 56.0;
const FOOTER_Y: f32 = 24.0;
/// Average Helvetica advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

pub type Rgb = (f32, f32, f32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Italic,
}

impl Font {
    const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Italic];

    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold    => "F2",
            Font::Italic  => "F3",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold    => "Helvetica-Bold",
            Font::Italic  => "Helvetica-Oblique",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Replaces anything outside printable ASCII with `?`. The standard Type 1
/// fonts have no glyphs for it.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' => ' ',
            '\n' => '\n',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

/// Greedy word wrap at `width` characters. Explicit newlines start a new
/// line and blank lines are kept; words longer than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let mut line = String::new();
        for word in raw.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(word.drain(..width).collect());
            }
            let word: String = word.into_iter().collect();
            if word.is_empty() {
                continue;
            }
            let needed = if line.is_empty() { word.len() } else { line.len() + 1 + word.len() };
            if needed > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    lines
}

/// Estimated rendered width of `text` at `size`.
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_WIDTH
}

pub struct Layout {
    pages: Vec<Vec<Operation>>,
    y: f32,
    header: String,
}

impl Layout {
    /// Starts a document on its first page. `header` is printed on every
    /// page after the first.
    pub fn new(header: impl Into<String>) -> Self {
        let mut layout = Self { pages: Vec::new(), y: 0.0, header: header.into() };
        layout.add_page();
        layout
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Current cursor height, measured from the bottom of the page.
    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn add_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN;

        let number = format!("Page {}", self.pages.len());
        let x = (PAGE_WIDTH - text_width(&number, 8.0)) / 2.0;
        self.text_at(x, FOOTER_Y, &number, Font::Italic, 8.0);

        if self.pages.len() > 1 {
            let header = clean_text(&self.header);
            self.cell(&header, Font::Italic, 10.0, 14.0, Align::Right);
            self.ln(14.0);
        }
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Breaks the page if fewer than `height` points remain.
    pub fn ensure(&mut self, height: f32) {
        if self.y - height < BOTTOM_LIMIT {
            self.add_page();
        }
    }

    /// Moves the cursor down; the next cell triggers any page break.
    pub fn ln(&mut self, height: f32) {
        self.y -= height;
    }

    /// Claims a block of `height` points and returns its top edge.
    pub fn reserve(&mut self, height: f32) -> f32 {
        self.ensure(height);
        let top = self.y;
        self.y -= height;
        top
    }

    pub fn text_at(&mut self, x: f32, y: f32, text: &str, font: Font, size: f32) {
        self.ops().extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource().into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// One line of text occupying `height` points.
    pub fn cell(&mut self, text: &str, font: Font, size: f32, height: f32, align: Align) {
        self.ensure(height);
        let text = clean_text(text);
        let usable = PAGE_WIDTH - 2.0 * MARGIN;
        let x = match align {
            Align::Left   => MARGIN,
            Align::Center => MARGIN + (usable - text_width(&text, size)).max(0.0) / 2.0,
            Align::Right  => MARGIN + (usable - text_width(&text, size)).max(0.0),
        };
        let baseline = self.y - height + (height - size) / 2.0 + size * 0.2;
        self.text_at(x, baseline, &text, font, size);
        self.y -= height;
    }

    /// Wrapped, left-aligned text.
    pub fn paragraph(&mut self, text: &str, font: Font, size: f32, line_height: f32) {
        let chars = ((PAGE_WIDTH - 2.0 * MARGIN) / (size * AVG_GLYPH_WIDTH)) as usize;
        for line in wrap(&clean_text(text), chars) {
            self.cell(&line, font, size, line_height, Align::Left);
        }
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        self.ops().extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![color.0.into(), color.1.into(), color.2.into()]),
            Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Filled polygon with a thin white outline.
    pub fn fill_polygon(&mut self, points: &[(f32, f32)], color: Rgb) {
        let Some(((x0, y0), rest)) = points.split_first() else {
            return;
        };
        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("rg", vec![color.0.into(), color.1.into(), color.2.into()]));
        ops.push(Operation::new("RG", vec![1.0f32.into(), 1.0f32.into(), 1.0f32.into()]));
        ops.push(Operation::new("w", vec![0.8f32.into()]));
        ops.push(Operation::new("m", vec![(*x0).into(), (*y0).into()]));
        for (x, y) in rest {
            ops.push(Operation::new("l", vec![(*x).into(), (*y).into()]));
        }
        ops.push(Operation::new("h", vec![]));
        ops.push(Operation::new("B", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    /// Assembles the page tree.
    pub fn into_document(self) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = lopdf::Dictionary::new();
        for font in Font::ALL {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
            });
            fonts.set(font.resource(), id);
        }
        let resources_id = doc.add_object(dictionary! { "Font" => fonts });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let content = Content { operations };
            let bytes = content
                .encode()
                .map_err(|e| MedpulseError::Report(format!("content encoding failed: {e}")))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
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
                "MediaBox" => vec![0.0f32.into(), 0.0f32.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Ok(doc)
    }

    pub fn save(self, path: &Path) -> Result<()> {
        let mut doc = self.into_document()?;
        doc.save(path)
            .map_err(|e| MedpulseError::Report(format!("failed to write {}: {e}", path.display())))?;
        Ok(())
    }
}
