//! E-ink panel model with per-pixel change detection.
//!
//! The host drawing services render into this grayscale buffer in logical
//! (rotated) coordinates. After a callback the region containing changed
//! pixels is flushed to the simulator display in one `fill_contiguous`.

use core::convert::Infallible;

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_10X20};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PointsIter, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use log::debug;
use watch_sdk::{FillMode, Rotate, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Canvas edge length; the panel is square.
const WIDTH: usize = SCREEN_WIDTH as usize;
const HEIGHT: usize = SCREEN_HEIGHT as usize;
const PIXEL_COUNT: usize = WIDTH * HEIGHT;

/// Dash and gap length of `draw_dashed_line`.
const DASH_PX: usize = 4;

/// Font used by the CJK renderer; the simulator has no CJK glyphs and shows
/// a replacement character for them.
const CH_FONT: &MonoFont<'static> = &FONT_10X20;

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn full() -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: WIDTH - 1,
            max_y: HEIGHT - 1,
        }
    }
}

/// Raw host color to a gray level. Only the low byte carries meaning.
pub fn gray(raw: u16) -> Gray8 {
    Gray8::new((raw & 0xFF) as u8)
}

/// Host font for a requested pixel size.
fn font_for(size: u16) -> &'static MonoFont<'static> {
    if size < 16 { &FONT_6X10 } else { &FONT_10X20 }
}

pub struct FrameBuffer {
    pixels: Vec<Gray8>,
    dirty: Option<DirtyRect>,
    rotate: Rotate,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// A blank (white) panel.
    pub fn new() -> Self {
        Self {
            pixels: vec![Gray8::WHITE; PIXEL_COUNT],
            dirty: None,
            rotate: Rotate::Deg0,
        }
    }

    pub fn rotate(&self) -> Rotate {
        self.rotate
    }

    /// Rotate the logical canvas. Existing pixels stay where they are.
    pub fn set_rotate(&mut self, rotate: Rotate) {
        self.rotate = rotate;
    }

    /// Physical pixel for a logical coordinate.
    fn physical(&self, x: usize, y: usize) -> (usize, usize) {
        match self.rotate {
            Rotate::Deg0 => (x, y),
            Rotate::Deg90 => (WIDTH - 1 - y, x),
            Rotate::Deg180 => (WIDTH - 1 - x, HEIGHT - 1 - y),
            Rotate::Deg270 => (y, HEIGHT - 1 - x),
        }
    }

    /// Write a logical pixel, expanding the dirty rect only if it changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Gray8) {
        let (px, py) = self.physical(x, y);
        let idx = py * WIDTH + px;
        if self.pixels[idx] != color {
            self.pixels[idx] = color;
            match &mut self.dirty {
                Some(rect) => rect.expand(px, py),
                None => self.dirty = Some(DirtyRect::from_point(px, py)),
            }
        }
    }

    /// Pixel at a physical coordinate.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Gray8> {
        (x < WIDTH && y < HEIGHT).then(|| self.pixels[y * WIDTH + x])
    }

    /// Physical bounding box of unflushed changes.
    pub fn dirty_area(&self) -> Option<Rectangle> {
        self.dirty.map(|r| {
            Rectangle::with_corners(
                Point::new(r.min_x as i32, r.min_y as i32),
                Point::new(r.max_x as i32, r.max_y as i32),
            )
        })
    }

    /// Mark the whole panel for the next flush, as a full e-ink refresh does.
    pub fn invalidate(&mut self) {
        self.dirty = Some(DirtyRect::full());
    }

    /// Flush the dirty region to `display`, then reset the dirty state.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Gray8>,
    {
        let Some(rect) = self.dirty.take() else {
            return Ok(());
        };

        let width = rect.max_x - rect.min_x + 1;
        let height = rect.max_y - rect.min_y + 1;

        debug!(
            "Flushing {}x{} dirty region at ({}, {})",
            width, height, rect.min_x, rect.min_y
        );

        let area = Rectangle::new(
            Point::new(rect.min_x as i32, rect.min_y as i32),
            Size::new(width as u32, height as u32),
        );

        let pixels = &self.pixels;
        let pixel_iter = (rect.min_y..=rect.max_y).flat_map(move |y| {
            let row_start = y * WIDTH + rect.min_x;
            pixels[row_start..row_start + width].iter().copied()
        });

        display.fill_contiguous(&area, pixel_iter)
    }

    // -----------------------------------------------------------------------
    // Host drawing services
    // -----------------------------------------------------------------------

    pub fn clear_to(&mut self, color: u16) {
        let _ = self.clear(gray(color));
    }

    pub fn draw_pixel(&mut self, x: u16, y: u16, color: u16) {
        let _ = Pixel(Point::new(x.into(), y.into()), gray(color)).draw(self);
    }

    pub fn draw_line(&mut self, start: (u16, u16), end: (u16, u16), color: u16) {
        let _ = line(start, end)
            .into_styled(PrimitiveStyle::with_stroke(gray(color), 1))
            .draw(self);
    }

    pub fn draw_dashed_line(&mut self, start: (u16, u16), end: (u16, u16), color: u16) {
        let color = gray(color);
        let dashes = line(start, end)
            .points()
            .enumerate()
            .filter(|(i, _)| (i / DASH_PX) % 2 == 0)
            .map(|(_, p)| Pixel(p, color));
        let _ = self.draw_iter(dashes);
    }

    /// Rectangle between two inclusive corners.
    pub fn draw_rect(&mut self, start: (u16, u16), end: (u16, u16), color: u16, fill: u8) {
        let area = Rectangle::with_corners(point(start), point(end));
        let style = if fill == FillMode::Fill as u8 {
            PrimitiveStyle::with_fill(gray(color))
        } else {
            PrimitiveStyle::with_stroke(gray(color), 1)
        };
        let _ = area.into_styled(style).draw(self);
    }

    pub fn draw_circle(&mut self, center: (i32, i32), radius: i32, color: i32, fill: i32) {
        if radius < 0 {
            return;
        }
        let color = gray(color as u16);
        let style = if fill == FillMode::Fill as i32 {
            PrimitiveStyle::with_fill(color)
        } else {
            PrimitiveStyle::with_stroke(color, 1)
        };
        let _ = Circle::with_center(Point::new(center.0, center.1), radius as u32 * 2 + 1)
            .into_styled(style)
            .draw(self);
    }

    /// Blit a 1-bpp bitmap, rows padded to whole bytes, MSB first.
    pub fn draw_bmp(&mut self, origin: (u16, u16), size: (u16, u16), data: &[u8], color: u16, transparent: bool) {
        let (w, h) = (usize::from(size.0), usize::from(size.1));
        let stride = w.div_ceil(8);
        let ink = gray(color);
        let paper = Gray8::WHITE;

        let pixels = (0..h).flat_map(|row| (0..w).map(move |col| (row, col))).filter_map(|(row, col)| {
            let byte = data.get(row * stride + col / 8)?;
            let set = byte & (0x80 >> (col % 8)) != 0;
            let pos = Point::new(
                i32::from(origin.0) + col as i32,
                i32::from(origin.1) + row as i32,
            );
            match (set, transparent) {
                (true, _) => Some(Pixel(pos, ink)),
                (false, false) => Some(Pixel(pos, paper)),
                (false, true) => None,
            }
        });
        let _ = self.draw_iter(pixels);
    }

    /// Text with its top-left corner at `origin`. Returns the x past it.
    pub fn draw_str(&mut self, origin: (u16, u16), text: &str, size: u16, color: u16) -> u16 {
        self.draw_text(origin, text, font_for(size), color)
    }

    pub fn draw_ch_str(&mut self, origin: (u16, u16), text: &str, color: u16) -> u16 {
        self.draw_text(origin, text, CH_FONT, color)
    }

    fn draw_text(&mut self, origin: (u16, u16), text: &str, font: &MonoFont<'_>, color: u16) -> u16 {
        let style = MonoTextStyle::new(font, gray(color));
        let end = Text::with_baseline(text, point(origin), style, Baseline::Top)
            .draw(self)
            .unwrap_or(point(origin));
        end.x.clamp(0, i32::from(SCREEN_WIDTH)) as u16
    }

    /// Word-wrapped text inside inclusive corners. Returns the y below the
    /// last line drawn.
    pub fn draw_rect_str(&mut self, text: &str, start: (u16, u16), end: (u16, u16), color: u16) -> u16 {
        let font = CH_FONT;
        let glyph_w = font.character_size.width + font.character_spacing;
        let line_h = font.character_size.height;
        let cols = ((u32::from(end.0.saturating_sub(start.0)) + 1) / glyph_w).max(1) as usize;

        let mut y = start.1;
        for line in wrap(text, cols) {
            if u32::from(y) + line_h > u32::from(end.1) + 1 {
                break;
            }
            self.draw_text((start.0, y), &line, font, color);
            y += line_h as u16;
        }
        y
    }
}

fn point(p: (u16, u16)) -> Point {
    Point::new(p.0.into(), p.1.into())
}

fn line(start: (u16, u16), end: (u16, u16)) -> Line {
    Line::new(point(start), point(end))
}

/// Greedy word wrap to `cols` characters; over-long words are split.
fn wrap(text: &str, cols: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > cols {
            if !current.is_empty() {
                lines.push(core::mem::take(&mut current));
            }
            lines.push(word.drain(..cols).collect());
        }
        let needed = if current.is_empty() { word.len() } else { current.chars().count() + 1 + word.len() };
        if needed > cols && !current.is_empty() {
            lines.push(core::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Gray8;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (x, y) = (coord.x, coord.y);
            if x >= 0 && y >= 0 && (x as usize) < WIDTH && (y as usize) < HEIGHT {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let x_start = (area.top_left.x.max(0) as usize).min(WIDTH);
        let y_start = (area.top_left.y.max(0) as usize).min(HEIGHT);
        let x_end = ((area.top_left.x.max(0) as usize).saturating_add(area.size.width as usize)).min(WIDTH);
        let y_end = ((area.top_left.y.max(0) as usize).saturating_add(area.size.height as usize)).min(HEIGHT);

        for y in y_start..y_end {
            for x in x_start..x_end {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}
