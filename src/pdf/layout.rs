//! Text layout of a single PDF page
//!
//! Receives decoded characters together with their text rendering matrix
//! and records a user-space box for every character. Separators are
//! synthesised from geometry: a newline when the baseline moves, a space
//! when the gap between glyphs is wider than a fraction of the font size.

use std::ops::Range;

/// Affine matrix `[a b c d e f]` in PDF row-vector convention
pub type Matrix = [f32; 6];

/// Glyph extents in glyph space (fractions of the font size)
const ASCENT: f32 = 0.8;
const DESCENT: f32 = -0.2;

/// Horizontal gap, relative to font size, that reads as a word break
const SPACE_GAP_RATIO: f32 = 0.15;

/// Vertical shift, relative to font size, that reads as a new line
const LINE_SHIFT_RATIO: f32 = 0.5;

pub fn transform(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Axis-aligned rectangle in user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    fn bounding(points: &[(f32, f32)]) -> Self {
        let mut rect = Rect {
            x0: f32::INFINITY,
            y0: f32::INFINITY,
            x1: f32::NEG_INFINITY,
            y1: f32::NEG_INFINITY,
        };
        for &(x, y) in points {
            rect.x0 = rect.x0.min(x);
            rect.y0 = rect.y0.min(y);
            rect.x1 = rect.x1.max(x);
            rect.y1 = rect.y1.max(y);
        }
        rect
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// One emitted character and where it was drawn
#[derive(Debug, Clone, Copy)]
pub struct Glyph {
    /// Byte offset of the character in `PageLayout::text`
    pub offset: usize,
    pub rect: Rect,
    /// Visual line the glyph belongs to
    pub line: usize,
}

/// Text of one page with per-character geometry
#[derive(Debug, Default)]
pub struct PageLayout {
    pub text: String,
    pub glyphs: Vec<Glyph>,
}

impl PageLayout {
    /// Highlight rectangles covering a byte range of `text`, one per line
    pub fn match_rects(&self, range: Range<usize>) -> Vec<Rect> {
        let start = self.glyphs.partition_point(|g| g.offset < range.start);
        let mut rects: Vec<(usize, Rect)> = Vec::new();

        for glyph in self.glyphs[start..]
            .iter()
            .take_while(|g| g.offset < range.end)
        {
            match rects.last_mut() {
                Some((line, rect)) if *line == glyph.line => *rect = rect.union(&glyph.rect),
                _ => rects.push((glyph.line, glyph.rect)),
            }
        }

        rects.into_iter().map(|(_, rect)| rect).collect()
    }
}

/// Last glyph drawn, for separator decisions
#[derive(Debug, Clone, Copy)]
struct PenPosition {
    end_x: f32,
    baseline_y: f32,
}

/// Accumulates the characters of one page in drawing order
#[derive(Debug, Default)]
pub struct PageBuilder {
    line: usize,
    pen: Option<PenPosition>,
    layout: PageLayout,
}

impl PageBuilder {
    /// Record one decoded character.
    ///
    /// `trm` maps text space to user space without the font size; `width`
    /// is the advance in glyph space, already divided by 1000.
    pub fn push(&mut self, text: &str, trm: &Matrix, width: f32, font_size: f32) {
        let at = |x: f32, y: f32| transform(trm, x * font_size, y * font_size);

        let corners = [
            at(0.0, DESCENT),
            at(width, DESCENT),
            at(0.0, ASCENT),
            at(width, ASCENT),
        ];
        let (origin_x, origin_y) = at(0.0, 0.0);
        let (end_x, _) = at(width, 0.0);
        let size = ((trm[2] * trm[2] + trm[3] * trm[3]).sqrt() * font_size).max(f32::EPSILON);

        if let Some(pen) = self.pen {
            let same_line = (origin_y - pen.baseline_y).abs() <= size * LINE_SHIFT_RATIO;
            if !same_line {
                self.line += 1;
                self.separate('\n');
            } else if origin_x - pen.end_x > size * SPACE_GAP_RATIO || origin_x < pen.end_x - size
            {
                self.separate(' ');
            }
        }

        if text.is_empty() || text.chars().all(|c| c.is_control() && !c.is_whitespace()) {
            return;
        }

        self.layout.glyphs.push(Glyph {
            offset: self.layout.text.len(),
            rect: Rect::bounding(&corners),
            line: self.line,
        });
        self.layout.text.push_str(text);
        self.pen = Some(PenPosition {
            end_x,
            baseline_y: origin_y,
        });
    }

    fn separate(&mut self, sep: char) {
        let ends_blank = self
            .layout
            .text
            .chars()
            .next_back()
            .map(char::is_whitespace)
            .unwrap_or(true);
        if !ends_blank {
            self.layout.text.push(sep);
        }
    }

    pub fn finish(self) -> PageLayout {
        self.layout
    }
}
