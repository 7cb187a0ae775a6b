//! Display services and an `embedded-graphics` target over them.
//!
//! The firmware owns the e-ink framebuffer; the application only issues
//! drawing commands. Coordinates are pixels on the 200x200 logical canvas
//! (after rotation), colors are the raw values from [`crate::color`].
//! The panel is refreshed by the host after a callback returns, according to
//! the [`UpdateType`](crate::UpdateType) the callback reports.

use core::convert::Infallible;
use core::ffi::c_int;

use embedded_graphics::pixelcolor::{Gray8, GrayColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::Vec;

use crate::error::{TextError, TextResult};
use crate::types::{FillMode, Rotate, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::table::{self, Tag};

host_fns! {
    /// Fill the whole canvas with `color`.
    pub fn clear(color: u16) => EinkClear;

    pub fn draw_pixel(x: u16, y: u16, color: u16) => EinkDrawpixel;

    pub fn draw_line(start_x: u16, start_y: u16, end_x: u16, end_y: u16, color: u16) => EinkDrawline;

    pub fn draw_dashed_line(start_x: u16, start_y: u16, end_x: u16, end_y: u16, color: u16) => EinkDrawdashedline;

    /// Rectangle between two corners; `fill_mode` is a [`FillMode`] value.
    pub fn draw_rect(start_x: u16, start_y: u16, end_x: u16, end_y: u16, color: u16, fill_mode: u8) => EinkDrawrect;

    pub fn draw_circle(x_center: c_int, y_center: c_int, radius: c_int, color: c_int, fill_mode: c_int) => EinkDrawcircle;

    /// Blit a 1-bpp bitmap of `w`x`h` pixels, set bits drawn in `color`.
    /// With `transparent != 0` clear bits leave the canvas untouched.
    ///
    /// # Safety
    ///
    /// `data` must be readable for the bitmap's full size.
    pub unsafe fn draw_bmp(x: u16, y: u16, w: u16, h: u16, data: *const u8, color: u16, transparent: u8) => EinkDrawBmp;

    /// Draw NUL-terminated text with the host font at pixel `size`.
    /// Returns the x coordinate just past the drawn text.
    ///
    /// # Safety
    ///
    /// `chr` must point to a NUL-terminated string.
    pub unsafe fn draw_str(x: u16, y: u16, chr: *const u8, size: u16, color: u16) -> u16 => EinkDrawstr;

    /// Draw NUL-terminated text (CJK capable font).
    ///
    /// # Safety
    ///
    /// `chr` must point to a NUL-terminated string.
    pub unsafe fn draw_ch_str(x: u16, y: u16, chr: *const u8, color: u16) -> u16 => EinkDrawchstr;

    /// Draw NUL-terminated text wrapped inside a rectangle.
    ///
    /// # Safety
    ///
    /// `chr` must point to a NUL-terminated string.
    pub unsafe fn draw_rect_str(chr: *const u8, start_x: u16, start_y: u16, end_x: u16, end_y: u16, color: u16) -> u16 => EinkDrawRectstr;
}

/// Rotate the logical canvas.
///
/// The firmware's slot takes the rotation as a byte.
#[inline]
pub fn set_rotate(rotate: Rotate) {
    // SAFETY: slot layout fixed by the firmware: `void (uint8_t)`.
    unsafe { table::resolve::<unsafe extern "C" fn(u8)>(Tag::EinkSetRotate)(rotate as u8) }
}

/// Longest string the text helpers render, excluding the NUL.
pub const MAX_TEXT_LEN: usize = 63;

/// Copy `text` into a NUL-terminated stack buffer for the host renderer.
fn c_text(text: &str) -> TextResult<Vec<u8, { MAX_TEXT_LEN + 1 }>> {
    let too_long = |_| TextError::TooLong { max: MAX_TEXT_LEN };
    let mut buf = Vec::new();
    buf.extend_from_slice(text.as_bytes()).map_err(too_long)?;
    buf.push(0).map_err(|_| TextError::TooLong { max: MAX_TEXT_LEN })?;
    Ok(buf)
}

/// Draw `text` at `size` pixels. Returns the x coordinate past the text.
pub fn text(x: u16, y: u16, text: &str, size: u16, color: u16) -> TextResult<u16> {
    let buf = c_text(text)?;
    // SAFETY: `buf` is NUL-terminated and outlives the call.
    Ok(unsafe { draw_str(x, y, buf.as_ptr(), size, color) })
}

/// Draw `text` with the CJK-capable font.
pub fn text_ch(x: u16, y: u16, text: &str, color: u16) -> TextResult<u16> {
    let buf = c_text(text)?;
    // SAFETY: as above.
    Ok(unsafe { draw_ch_str(x, y, buf.as_ptr(), color) })
}

/// Draw `text` wrapped inside `area`.
pub fn text_in(area: Rectangle, text: &str, color: u16) -> TextResult<u16> {
    let buf = c_text(text)?;
    let (start, end) = corners(&area).ok_or(TextError::OffCanvas)?;
    // SAFETY: as above.
    Ok(unsafe { draw_rect_str(buf.as_ptr(), start.0, start.1, end.0, end.1, color) })
}

/// Outline or fill a rectangle given in `embedded-graphics` terms.
pub fn rect(area: Rectangle, color: u16, fill: FillMode) {
    if let Some((start, end)) = corners(&area) {
        draw_rect(start.0, start.1, end.0, end.1, color, fill as u8);
    }
}

/// Inclusive canvas corners of `area`, clipped; `None` if nothing is visible.
fn corners(area: &Rectangle) -> Option<((u16, u16), (u16, u16))> {
    let area = area.intersection(&HostDisplay::bounds_rect());
    let end = area.bottom_right()?;
    Some((
        (area.top_left.x as u16, area.top_left.y as u16),
        (end.x as u16, end.y as u16),
    ))
}

/// `DrawTarget` that forwards to the host display services.
///
/// Lets applications draw with `embedded-graphics` primitives, fonts and
/// layouts. Individual pixels go through `draw_pixel`; solid fills collapse
/// into one filled `draw_rect` (inclusive end corner) and `clear` into one
/// host `clear`, which keeps the number of indirect calls low. Everything is
/// clipped to the canvas before it reaches the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostDisplay;

impl HostDisplay {
    pub const fn new() -> Self {
        Self
    }

    fn bounds_rect() -> Rectangle {
        Rectangle::new(
            Point::zero(),
            Size::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32),
        )
    }

    /// Raw host color for a gray level.
    pub fn raw_color(color: Gray8) -> u16 {
        color.luma() as u16
    }
}

impl OriginDimensions for HostDisplay {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32)
    }
}

impl DrawTarget for HostDisplay {
    type Color = Gray8;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let w = SCREEN_WIDTH as i32;
        let h = SCREEN_HEIGHT as i32;

        for Pixel(coord, color) in pixels {
            if (0..w).contains(&coord.x) && (0..h).contains(&coord.y) {
                draw_pixel(coord.x as u16, coord.y as u16, Self::raw_color(color));
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        rect(*area, Self::raw_color(color), FillMode::Fill);
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        clear(Self::raw_color(color));
        Ok(())
    }
}
