/*
 *  display/renderer.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Partial-frame renderer: embedded-graphics drawing in horizontal bands
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use core::convert::Infallible;

use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::display::error::DriverError;
use crate::display::panel::{ByteOrder, PixelFormat};
use crate::display::pixel;
use crate::display::region::FlushRegion;
use crate::display::traits::{DisplayCapabilities, DisplayPanel};

/// Lines per band when the caller has no preference
pub const DEFAULT_BAND_LINES: u16 = 20;

/// Renders a frame through a buffer a few lines tall
///
/// The scene closure is replayed once per band against a [`Band`] that
/// reports the full panel size but keeps only the rows of the current band.
/// Each band is packed to the panel's wire format and flushed before the
/// next one is drawn, so a 320x240 RGB565 frame needs a 12.8 KB buffer
/// rather than 150 KB.
pub struct BandRenderer {
    width: u16,
    height: u16,
    band_lines: u16,
    format: PixelFormat,
    byte_order: ByteOrder,
    pixels: Vec<Rgb565>,
    packed: Vec<u8>,
}

impl BandRenderer {
    /// `band_lines` is clamped to `1..=height`
    pub fn new(capabilities: &DisplayCapabilities, band_lines: u16) -> Self {
        let (width, height) = (capabilities.width, capabilities.height);
        let band_lines = band_lines.clamp(1, height.max(1));
        let len = width as usize * band_lines as usize;

        Self {
            width,
            height,
            band_lines,
            format: capabilities.pixel_format,
            byte_order: capabilities.byte_order,
            pixels: vec![Rgb565::BLACK; len],
            packed: Vec::with_capacity(len * capabilities.bytes_per_pixel()),
        }
    }

    pub fn band_lines(&self) -> u16 {
        self.band_lines
    }

    /// Bands needed to cover the panel
    pub fn band_count(&self) -> usize {
        self.height.div_ceil(self.band_lines) as usize
    }

    /// Draw and flush one full frame
    ///
    /// Every band starts cleared to `background`. Returns the number of
    /// bands flushed.
    pub fn render<P, F>(&mut self, panel: &mut P, background: Rgb565, mut scene: F) -> Result<usize, DriverError>
    where
        P: DisplayPanel + ?Sized,
        F: FnMut(&mut Band<'_>) -> Result<(), Infallible>,
    {
        let mut top = 0u16;
        let mut flushed = 0;

        while top < self.height {
            let rows = self.band_lines.min(self.height - top);
            let len = self.width as usize * rows as usize;

            let mut band = Band {
                pixels: &mut self.pixels[..len],
                width: self.width,
                height: self.height,
                top,
                rows,
            };
            band.fill(background);
            let Ok(()) = scene(&mut band);
            let region = band.region();

            self.packed.clear();
            pixel::pack_into(self.pixels[..len].iter().copied(), self.format, &mut self.packed);
            if self.byte_order == ByteOrder::Little {
                pixel::swap_rgb565_bytes(&mut self.packed);
            }

            panel.flush(region, &self.packed)?;

            top += rows;
            flushed += 1;
        }

        debug!("Rendered frame in {} bands of {} lines", flushed, self.band_lines);
        Ok(flushed)
    }
}

/// One horizontal slice of the frame, addressed in panel coordinates
pub struct Band<'b> {
    pixels: &'b mut [Rgb565],
    width: u16,
    height: u16,
    top: u16,
    rows: u16,
}

impl Band<'_> {
    /// Panel rows held by this band
    pub fn rows(&self) -> core::ops::Range<u16> {
        self.top..self.top + self.rows
    }

    /// Panel region this band is flushed to
    pub fn region(&self) -> FlushRegion {
        FlushRegion::new(0, self.top, self.width - 1, self.top + self.rows - 1)
    }

    fn fill(&mut self, color: Rgb565) {
        self.pixels.fill(color);
    }

    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x < 0 || p.y < self.top as i32 {
            return None;
        }
        let (x, y) = (p.x as usize, p.y as usize - self.top as usize);
        if x < self.width as usize && y < self.rows as usize {
            Some(y * self.width as usize + x)
        } else {
            None
        }
    }
}

impl OriginDimensions for Band<'_> {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for Band<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.pixels[i] = c;
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        // fast path for the rectangle fills primitives use
        let clipped = area.intersection(&self.region().to_rectangle());
        let Some(r) = FlushRegion::from_rectangle(&clipped) else {
            return Ok(());
        };

        let w = self.width as usize;
        let (x0, x1) = (r.x0 as usize, r.x1 as usize);
        for y in r.y0..=r.y1 {
            let base = (y - self.top) as usize * w;
            self.pixels[base + x0..=base + x1].fill(color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}
