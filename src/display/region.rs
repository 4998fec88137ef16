/*
 *  display/region.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Flush window addressed by CASET/RASET
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

use std::fmt;

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::primitives::Rectangle;

/// Rectangle of panel pixels with inclusive corners
///
/// A region is only meaningful against a panel size: it is valid when
/// `x0 <= x1 < width` and `y0 <= y1 < height`, see [`FlushRegion::fits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlushRegion {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl FlushRegion {
    pub const fn new(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// The whole panel
    pub const fn full(width: u16, height: u16) -> Self {
        Self::new(0, 0, width.saturating_sub(1), height.saturating_sub(1))
    }

    /// A single full-width row
    pub const fn row(y: u16, width: u16) -> Self {
        Self::new(0, y, width.saturating_sub(1), y)
    }

    /// Checks the region invariant against a panel of `width` x `height`
    pub fn fits(&self, width: u16, height: u16) -> bool {
        self.x0 <= self.x1 && self.y0 <= self.y1 && self.x1 < width && self.y1 < height
    }

    /// Columns covered; zero for an inverted region
    pub fn width(&self) -> usize {
        if self.x1 < self.x0 { 0 } else { (self.x1 - self.x0) as usize + 1 }
    }

    /// Rows covered; zero for an inverted region
    pub fn height(&self) -> usize {
        if self.y1 < self.y0 { 0 } else { (self.y1 - self.y0) as usize + 1 }
    }

    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Converts an embedded-graphics rectangle, `None` when it is empty
    /// or reaches into negative / beyond-u16 coordinates
    pub fn from_rectangle(rect: &Rectangle) -> Option<Self> {
        let br = rect.bottom_right()?;
        let x0 = u16::try_from(rect.top_left.x).ok()?;
        let y0 = u16::try_from(rect.top_left.y).ok()?;
        let x1 = u16::try_from(br.x).ok()?;
        let y1 = u16::try_from(br.y).ok()?;
        Some(Self::new(x0, y0, x1, y1))
    }

    pub fn to_rectangle(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.x0 as i32, self.y0 as i32),
            Size::new(self.width() as u32, self.height() as u32),
        )
    }
}

impl fmt::Display for FlushRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})-({},{})", self.x0, self.y0, self.x1, self.y1)
    }
}
