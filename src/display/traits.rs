/*
 *  display/traits.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Interface a rendering engine uses to reach a panel
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

use crate::display::error::DriverError;
use crate::display::panel::{ByteOrder, ColorOrder, PixelFormat};
use crate::display::region::FlushRegion;
use crate::display::state::PanelState;

/// Display capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// Controller name, e.g. "ST7789"
    pub controller: &'static str,

    /// Visible width in pixels
    pub width: u16,

    /// Visible height in pixels
    pub height: u16,

    /// Sub-pixel order the panel was configured with
    pub color_order: ColorOrder,

    /// Wire format expected by `flush`
    pub pixel_format: PixelFormat,

    /// Byte order expected in `flush` buffers
    pub byte_order: ByteOrder,

    /// Whether a backlight line is wired
    pub supports_backlight: bool,
}

impl DisplayCapabilities {
    pub fn bytes_per_pixel(&self) -> usize {
        self.pixel_format.bytes_per_pixel()
    }

    /// Bytes a buffer for `region` must hold
    pub fn buffer_len(&self, region: &FlushRegion) -> usize {
        region.pixel_count() * self.bytes_per_pixel()
    }
}

/// Minimal panel abstraction - what a rendering engine needs
///
/// Geometry query, init and flush. Object safe, so an engine can hold a
/// `&mut dyn DisplayPanel` without knowing the controller model.
pub trait DisplayPanel {
    /// Returns the capabilities of this panel
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the panel dimensions as (width, height)
    fn dimensions(&self) -> (u16, u16) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Current lifecycle state
    ///
    /// Teardown does not change it: a torn-down panel keeps reporting the
    /// state it was in, and [`is_released`](Self::is_released) tells the
    /// two apart.
    fn state(&self) -> PanelState;

    /// True once [`teardown`](Self::teardown) has handed the control lines
    /// back; every later call that drives a line fails with `Unsupported`
    fn is_released(&self) -> bool;

    /// Run the controller power-on sequence
    fn init(&mut self) -> Result<(), DriverError>;

    /// Stream a packed pixel buffer into `region`
    ///
    /// `pixels` must hold exactly `region.pixel_count()` pixels in the
    /// format and byte order reported by [`capabilities`](Self::capabilities).
    fn flush(&mut self, region: FlushRegion, pixels: &[u8]) -> Result<(), DriverError>;

    /// Backlight level, 0 is off (returns an error if no backlight is wired)
    fn set_backlight(&mut self, level: u8) -> Result<(), DriverError>;

    /// Leave the control lines in a safe state
    fn teardown(&mut self) -> Result<(), DriverError>;
}
