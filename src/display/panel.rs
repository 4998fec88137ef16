/*
 *  display/panel.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Immutable panel configuration captured at driver construction
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

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::display::controller::ControllerModel;
use crate::display::error::DriverError;

/// Lowest SPI clock accepted for any controller
pub const MIN_PIXEL_CLOCK_HZ: u32 = 100_000;

/// Clock used when the configuration does not name one
pub const DEFAULT_PIXEL_CLOCK_HZ: u32 = 20_000_000;

/// Sub-pixel order of the physical panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Interface pixel format sent over the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 16 bpp, two bytes per pixel
    #[default]
    Rgb565,

    /// 18 bpp, three bytes per pixel (6 bits left-aligned in each)
    Rgb666,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb565 => 2,
            PixelFormat::Rgb666 => 3,
        }
    }

    pub const fn bits_per_pixel(self) -> u8 {
        match self {
            PixelFormat::Rgb565 => 16,
            PixelFormat::Rgb666 => 18,
        }
    }
}

/// Byte order of the pixel buffers handed to `flush`
///
/// The controller always expects RGB565 most significant byte first.
/// Renderers that fill native `u16` words on a little-endian host produce
/// swapped pairs; `Little` makes the driver swap them while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

/// GPIO line assignments (numbering is whatever the transport maps)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelPins {
    pub reset: u32,
    pub dc: u32,
    pub cs: u32,
    #[serde(default)]
    pub backlight: Option<u32>,
    #[serde(default)]
    pub backlight_active_low: bool,
}

impl Default for PanelPins {
    /// Common Raspberry Pi wiring for ST7789 hats (BCM numbering, CE0)
    fn default() -> Self {
        Self {
            reset: 27,
            dc: 25,
            cs: 8,
            backlight: Some(18),
            backlight_active_low: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub model: ControllerModel,
    pub width: u16,
    pub height: u16,
    pub color_order: ColorOrder,
    pub pixel_format: PixelFormat,
    pub byte_order: ByteOrder,
    pub swap_xy: bool,
    pub mirror_x: bool,
    pub mirror_y: bool,
    pub invert: bool,
    pub pixel_clock_hz: u32,
    /// Column offset of the visible area inside controller RAM
    pub x_offset: u16,
    /// Row offset of the visible area inside controller RAM
    pub y_offset: u16,
    /// Blank panel RAM before display-on
    pub clear_on_init: bool,
    pub pins: PanelPins,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            model: ControllerModel::default(),
            width: 240,
            height: 320,
            color_order: ColorOrder::default(),
            pixel_format: PixelFormat::default(),
            byte_order: ByteOrder::default(),
            swap_xy: false,
            mirror_x: false,
            mirror_y: false,
            invert: false,
            pixel_clock_hz: DEFAULT_PIXEL_CLOCK_HZ,
            x_offset: 0,
            y_offset: 0,
            clear_on_init: true,
            pins: PanelPins::default(),
        }
    }
}

impl PanelConfig {
    pub fn bytes_per_pixel(&self) -> usize {
        self.pixel_format.bytes_per_pixel()
    }

    /// Checks geometry, clock and wiring against the controller model
    pub fn validate(&self) -> Result<(), DriverError> {
        let profile = self.model.profile();

        if self.width == 0 || self.height == 0 {
            return Err(DriverError::Config(format!(
                "width/height must be > 0, got {}x{}",
                self.width, self.height
            )));
        }

        if !profile.fits(self.width, self.height, self.x_offset, self.y_offset, self.swap_xy) {
            return Err(DriverError::Config(format!(
                "{}x{} at offset ({},{}) with swap_xy={} exceeds {} frame memory {}x{}",
                self.width,
                self.height,
                self.x_offset,
                self.y_offset,
                self.swap_xy,
                profile.name,
                profile.ram_columns,
                profile.ram_rows
            )));
        }

        if !(MIN_PIXEL_CLOCK_HZ..=profile.max_clock_hz).contains(&self.pixel_clock_hz) {
            return Err(DriverError::Config(format!(
                "pixel clock {} Hz outside {}..={} Hz for {}",
                self.pixel_clock_hz, MIN_PIXEL_CLOCK_HZ, profile.max_clock_hz, profile.name
            )));
        }

        if self.byte_order == ByteOrder::Little && self.pixel_format != PixelFormat::Rgb565 {
            return Err(DriverError::Config(
                "little-endian buffers are only defined for rgb565".to_string(),
            ));
        }

        let PanelPins { reset, dc, cs, backlight, .. } = self.pins;
        let mut lines = vec![reset, dc, cs];
        lines.extend(backlight);
        let count = lines.len();
        lines.sort_unstable();
        lines.dedup();
        if lines.len() != count {
            return Err(DriverError::Config(format!(
                "control lines must be distinct: {:?}",
                self.pins
            )));
        }

        Ok(())
    }
}
