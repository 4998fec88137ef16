/*
 *  display/controller/mod.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Controller command set and per-model power-on tables
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

//! Controller models are described as data: a [`ControllerProfile`] carries
//! the reset timing, RAM geometry, clock ceiling and a flat table of
//! [`InitStep`]s. The driver runs any profile through the same interpreter,
//! so a new panel is one more table here and one more [`ControllerModel`]
//! variant.

pub mod ili9341;
pub mod st7789;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::display::panel::{ColorOrder, PixelFormat};

// MIPI DCS commands shared by ST7789 / ILI9341 class controllers
pub const SLPOUT: u8 = 0x11;
pub const NORON: u8 = 0x13;
pub const INVOFF: u8 = 0x20;
pub const INVON: u8 = 0x21;
pub const DISPOFF: u8 = 0x28;
pub const DISPON: u8 = 0x29;
pub const CASET: u8 = 0x2A;
pub const RASET: u8 = 0x2B;
pub const RAMWR: u8 = 0x2C;
pub const MADCTL: u8 = 0x36;
pub const COLMOD: u8 = 0x3A;

// MADCTL flags
pub const MADCTL_MY: u8 = 0x80; // row address order
pub const MADCTL_MX: u8 = 0x40; // column address order
pub const MADCTL_MV: u8 = 0x20; // row/column exchange
pub const MADCTL_BGR: u8 = 0x08;

/// One entry of a power-on table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    /// Command byte followed by its parameters
    Cmd(u8, &'static [u8]),

    /// Wait before the next entry
    DelayMs(u32),
}

/// Static description of a controller, sourced from its datasheet
#[derive(Debug, Clone, Copy)]
pub struct ControllerProfile {
    pub name: &'static str,

    /// Native frame memory columns
    pub ram_columns: u16,

    /// Native frame memory rows
    pub ram_rows: u16,

    /// Minimum time RESX is held low
    pub reset_pulse_ms: u32,

    /// Wait after RESX is released before the first command
    pub reset_settle_ms: u32,

    /// Serial write clock ceiling
    pub max_clock_hz: u32,

    /// Vendor table run after reset, before configuration-derived commands
    pub init_sequence: &'static [InitStep],
}

impl ControllerProfile {
    /// Whether a `width` x `height` window at the given RAM offset fits frame
    /// memory; `swap_xy` (MADCTL MV) exchanges the RAM column and row counts
    pub fn fits(&self, width: u16, height: u16, x_offset: u16, y_offset: u16, swap_xy: bool) -> bool {
        let w = width as u32 + x_offset as u32;
        let h = height as u32 + y_offset as u32;
        let (cols, rows) = if swap_xy {
            (self.ram_rows as u32, self.ram_columns as u32)
        } else {
            (self.ram_columns as u32, self.ram_rows as u32)
        };
        w <= cols && h <= rows
    }
}

/// Supported controller models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ControllerModel {
    #[default]
    St7789,
    Ili9341,
}

impl ControllerModel {
    pub fn profile(self) -> &'static ControllerProfile {
        match self {
            ControllerModel::St7789 => &st7789::PROFILE,
            ControllerModel::Ili9341 => &ili9341::PROFILE,
        }
    }
}

/// MADCTL value for the configured orientation and color order
pub fn madctl(swap_xy: bool, mirror_x: bool, mirror_y: bool, order: ColorOrder) -> u8 {
    let mut value = 0;
    if mirror_y { value |= MADCTL_MY; }
    if mirror_x { value |= MADCTL_MX; }
    if swap_xy { value |= MADCTL_MV; }
    if order == ColorOrder::Bgr { value |= MADCTL_BGR; }
    value
}

/// COLMOD interface pixel format parameter
pub fn colmod(format: PixelFormat) -> u8 {
    match format {
        PixelFormat::Rgb565 => 0x55,
        PixelFormat::Rgb666 => 0x66,
    }
}

/// Big-endian start/end address pair for CASET / RASET
pub fn address_window(start: u16, end: u16) -> [u8; 4] {
    let [sh, sl] = start.to_be_bytes();
    let [eh, el] = end.to_be_bytes();
    [sh, sl, eh, el]
}
